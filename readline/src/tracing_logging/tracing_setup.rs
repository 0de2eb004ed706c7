// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::TracingConfig;

pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Simply initialize the tracing system with the provided [`TracingConfig`].
///
/// # Errors
///
/// If the log file can't be created, or a global subscriber is already set.
pub fn init(tracing_config: TracingConfig) -> miette::Result<()> {
    let Some(layers) = try_create_layers(&tracing_config)? else {
        return Ok(());
    };
    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|err| miette::miette!("can't install tracing subscriber: {err}"))
}

/// Returns the layers, or `None` for [`crate::WriterConfig::None`]. This does not
/// initialize the tracing system. Don't forget to do this manually, by calling `init`
/// on the returned layers.
///
/// For example, once you have the layers, you can run the following:
/// `try_create_layers(..).map(|layers| tracing_subscriber::registry().with(layers).init());`
///
/// # Errors
///
/// If the log file can't be created.
pub fn try_create_layers(
    tracing_config: &TracingConfig,
) -> miette::Result<Option<Vec<Box<DynLayer<tracing_subscriber::Registry>>>>> {
    let writer_config = &tracing_config.writer_config;
    let level_filter = tracing_config.level_filter;

    let display_layer = writer_config.create_display_layer(level_filter);
    let file_layer = writer_config.try_create_file_layer(level_filter)?;
    if display_layer.is_none() && file_layer.is_none() {
        return Ok(None);
    }

    let mut return_it: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];
    // Layers without their own filter (eg: OpenTelemetry) are covered by this one.
    return_it.push(Box::new(level_filter));
    return_it.extend(display_layer);
    return_it.extend(file_layer);
    Ok(Some(return_it))
}
