use crate::argparse::{AggregateArgs, Commands, CompileArgs, FieldsArgs, TextArgs};
use anyhow::Context;
use filterql::{compile, compile_text, fields_from_mappings, AggregationSpec, FilterSpec};
use log::info;
use serde_json::Value as JsonValue;
use std::io::Read;

pub fn handle_command(command: Commands, pretty: bool) -> anyhow::Result<()> {
    match command {
        Commands::Compile(args) => handle_compile(args, pretty),
        Commands::Text(args) => handle_text(args, pretty),
        Commands::Aggregate(args) => handle_aggregate(args, pretty),
        Commands::Fields(args) => handle_fields(args, pretty),
    }
}

fn handle_compile(args: CompileArgs, pretty: bool) -> anyhow::Result<()> {
    let raw = read_input(&args.spec)?;
    let spec = FilterSpec::from_json(&raw).context("parsing filter spec")?;
    print_json(&compile(&spec).to_json(), pretty)
}

fn handle_text(args: TextArgs, pretty: bool) -> anyhow::Result<()> {
    let query = compile_text(&args.query, &args.fields).context("compiling free-text query")?;
    print_json(&query.to_json(), pretty)
}

fn handle_aggregate(args: AggregateArgs, pretty: bool) -> anyhow::Result<()> {
    let raw = read_input(&args.spec)?;
    let spec = AggregationSpec::from_json(&raw).context("parsing aggregation spec")?;
    match spec.compile(args.terms_bucket_cap) {
        Some(request) => print_json(&request.to_json(), pretty),
        None => anyhow::bail!("aggregation spec did not compile to a request"),
    }
}

fn handle_fields(args: FieldsArgs, pretty: bool) -> anyhow::Result<()> {
    let raw = read_input(&args.mappings)?;
    let mappings: JsonValue = serde_json::from_str(&raw).context("parsing index mapping")?;
    let fields = fields_from_mappings(&mappings);
    info!("extracted {} searchable fields", fields.len());
    print_json(&serde_json::json!(fields), pretty)
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading spec from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path))
    }
}

fn print_json(value: &JsonValue, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}
