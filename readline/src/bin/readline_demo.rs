// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Interactive demo of [`r3bl_readline`].
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ > cargo run --bin readline_demo -- --ticker --complete /join /msg  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Type lines, use Up/Down and Ctrl+R on history, Tab to complete. Type `exit` or press
//! Ctrl+D to quit. With `--ticker` a background task prints above the prompt every
//! second while you type.

use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use clap::{Args, Parser};
use crossterm::style::Stylize;
use r3bl_readline::{AutoComplete, Config, DisplayPreference, InputFilter, Instance, Key,
                    PrefixCompleter, ReadlineEvent, TracingConfig, init};

#[derive(Debug, Parser)]
#[command(bin_name = "readline_demo")]
#[command(about = "Line editing with history, completion, and concurrent output")]
#[command(version)]
#[command(next_line_help = true)]
/// More info:
/// - <https://docs.rs/clap/latest/clap/_derive/#overview>
/// - <https://developerlife.com/2023/09/17/tuify-clap/>
pub struct CLIArg {
    #[command(flatten)]
    pub history_options: HistoryOption,

    #[arg(long, help = "Start in vim insert mode; Esc is bound to `~`")]
    pub vim: bool,

    #[arg(long, help = "Ask for a password before the first line")]
    pub password: bool,

    #[arg(long, help = "Log to this file, and above the prompt")]
    pub log_file: Option<String>,

    #[arg(long, help = "Print a tick above the prompt every second")]
    pub ticker: bool,

    #[arg(long, num_args = 1.., help = "Words offered by Tab completion")]
    pub complete: Vec<String>,
}

#[derive(Debug, Args)]
pub struct HistoryOption {
    #[arg(long, help = "Append submitted lines to this file")]
    pub history_file: Option<PathBuf>,

    #[arg(long, default_value_t = 500, help = "Max history entries, -1 disables history")]
    pub history_limit: i32,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli_arg = CLIArg::parse();

    let instance = Arc::new(Instance::try_new(create_config(&cli_arg))?);
    instance.capture_exit_signal()?;

    if let Some(log_file) = cli_arg.log_file.clone() {
        init(TracingConfig::new_file_and_display(
            Some(log_file),
            DisplayPreference::SharedWriter(instance.shared_writer()),
        ))?;
        // % is Display, ? is Debug.
        tracing::debug!(message = "Start logging...", cli_arg = ?cli_arg);
    }

    if cli_arg.ticker {
        spawn_ticker(&instance);
    }

    if cli_arg.password {
        let event = instance.read_password("password: ").await?;
        let length = match event {
            ReadlineEvent::Line(it) => it.chars().count(),
            ReadlineEvent::Interrupted | ReadlineEvent::Eof => 0,
        };
        writeln!(instance.shared_writer(), "got a password of {length} chars")
            .map_err(|err| miette::miette!("{err}"))?;
    }

    run_repl(&instance).await?;

    instance.close().await?;
    Ok(())
}

fn create_config(cli_arg: &CLIArg) -> Config {
    let auto_complete = (!cli_arg.complete.is_empty()).then(|| -> Arc<dyn AutoComplete> {
        let words = cli_arg.complete.iter().map(|it| PrefixCompleter::new(it));
        Arc::new(PrefixCompleter::root(words))
    });

    Config {
        prompt: format!("{} ", "demo>".green().bold()),
        history_file: cli_arg.history_options.history_file.clone(),
        history_limit: cli_arg.history_options.history_limit,
        auto_complete,
        vim_mode: cli_arg.vim,
        filter_input: cli_arg.vim.then(|| -> InputFilter {
            Arc::new(|key: Key| match key {
                Key::Char('~') => Some(Key::Esc),
                other => Some(other),
            })
        }),
        ..Default::default()
    }
}

fn spawn_ticker(instance: &Arc<Instance>) {
    let mut writer = instance.shared_writer();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let mut count = 0_u64;
        loop {
            interval.tick().await;
            count += 1;
            if writeln!(writer, "{}", format!("tick {count}").dark_grey()).is_err() {
                break;
            }
        }
    });
}

async fn run_repl(instance: &Instance) -> miette::Result<()> {
    let mut writer = instance.shared_writer();
    loop {
        match instance.read_line().await? {
            ReadlineEvent::Line(line) if line.trim() == "exit" => break,
            ReadlineEvent::Line(line) => {
                tracing::debug!(message = "line", line = %line);
                writeln!(writer, "you typed: {}", line.as_str().cyan())
                    .map_err(|err| miette::miette!("{err}"))?;
            }
            ReadlineEvent::Interrupted => {
                writeln!(writer, "{}", "interrupted, Ctrl+D to quit".yellow())
                    .map_err(|err| miette::miette!("{err}"))?;
            }
            ReadlineEvent::Eof => break,
        }
    }
    Ok(())
}
