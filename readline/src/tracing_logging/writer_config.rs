// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Debug, Formatter};

use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, registry::LookupSpan};

use crate::{DynLayer, SharedWriter, rolling_file_appender_impl};

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(true)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    };
}

/// The path is the log file to append to, eg: `/tmp/readline_demo.log`.
#[derive(Debug, Clone)]
pub enum WriterConfig {
    None,
    Display(DisplayPreference),
    File(String),
    DisplayAndFile(DisplayPreference, String),
}

#[derive(Clone)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
    /// Log lines are printed above the live prompt.
    SharedWriter(SharedWriter),
}

impl Debug for DisplayPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayPreference::Stdout => write!(f, "Stdout"),
            DisplayPreference::Stderr => write!(f, "Stderr"),
            DisplayPreference::SharedWriter(_) => write!(f, "SharedWriter"),
        }
    }
}

impl WriterConfig {
    fn display(&self) -> Option<&DisplayPreference> {
        match self {
            WriterConfig::Display(it) | WriterConfig::DisplayAndFile(it, _) => Some(it),
            WriterConfig::None | WriterConfig::File(_) => None,
        }
    }

    fn file(&self) -> Option<&str> {
        match self {
            WriterConfig::File(it) | WriterConfig::DisplayAndFile(_, it) => Some(it),
            WriterConfig::None | WriterConfig::Display(_) => None,
        }
    }

    /// This erases the concrete type of the writer, and returns a boxed layer. This
    /// is useful for composition of layers. There's more info in the docs
    /// [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/index.html#runtime-configuration-with-layers).
    #[must_use]
    pub fn create_display_layer<S>(&self, level_filter: LevelFilter) -> Option<Box<DynLayer<S>>>
    where
        S: tracing_core::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let fmt_layer = create_fmt!();
        let layer: Box<DynLayer<S>> = match self.display()? {
            DisplayPreference::Stdout => {
                Box::new(fmt_layer.with_writer(std::io::stdout).with_filter(level_filter))
            }
            DisplayPreference::Stderr => {
                Box::new(fmt_layer.with_writer(std::io::stderr).with_filter(level_filter))
            }
            DisplayPreference::SharedWriter(shared_writer) => {
                let shared_writer = shared_writer.clone();
                let tracing_writer = move || -> Box<dyn std::io::Write> {
                    Box::new(shared_writer.clone())
                };
                Box::new(fmt_layer.with_writer(tracing_writer).with_filter(level_filter))
            }
        };
        Some(layer)
    }

    /// Same as [`Self::create_display_layer`], for the log file.
    ///
    /// # Errors
    ///
    /// If the log file path can't be used.
    pub fn try_create_file_layer<S>(
        &self,
        level_filter: LevelFilter,
    ) -> miette::Result<Option<Box<DynLayer<S>>>>
    where
        S: tracing_core::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let Some(path) = self.file() else {
            return Ok(None);
        };
        let file = rolling_file_appender_impl::try_create(path)?;
        let fmt_layer = create_fmt!().with_ansi(false);
        Ok(Some(Box::new(
            fmt_layer.with_writer(file).with_filter(level_filter),
        )))
    }
}
