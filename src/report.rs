//! Rendering selected chunks and partition plans.
//!
//! `select` output is what the external test executor consumes, so the text
//! form is deliberately plain: one test id per line, in manifest order. The
//! plan view is for humans tuning a CI matrix and is styled with `console`.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;

use crate::chunk::Chunk;
use crate::config::OutputFormat;
use crate::manifest::Group;

#[derive(Serialize)]
struct SelectionOutput<'a> {
    chunk: usize,
    total_chunks: usize,
    weight: f64,
    groups: &'a [Group],
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    total_chunks: usize,
    total_weight: f64,
    target: f64,
    chunks: Vec<PlanChunk<'a>>,
}

#[derive(Serialize)]
struct PlanChunk<'a> {
    chunk: usize,
    weight: f64,
    tests: usize,
    groups: Vec<&'a str>,
}

/// Renders the chunk a worker should run.
pub fn render_selection(
    chunk: &Chunk<'_>,
    total_chunks: usize,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for test in chunk.tests() {
                writeln!(out, "{}", test.id)?;
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let output = SelectionOutput {
                chunk: chunk.number(),
                total_chunks,
                weight: chunk.weight(),
                groups: chunk.groups(),
            };
            Ok(serde_json::to_string_pretty(&output)? + "\n")
        }
    }
}

/// Renders every chunk of a partition with its weight against the target share.
pub fn render_plan(chunks: &[Chunk<'_>], format: OutputFormat) -> Result<String> {
    let total_weight: f64 = chunks.iter().map(|c| c.weight()).sum();
    let target = if chunks.is_empty() {
        0.0
    } else {
        total_weight / chunks.len() as f64
    };

    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(
                out,
                "{} chunks, total weight {}, target {:.2} per chunk",
                chunks.len(),
                total_weight,
                target
            )?;
            for chunk in chunks {
                let weight = format!("{:>10.2}", chunk.weight());
                let weight = if chunk.weight() > target * 1.5 {
                    console::style(weight).yellow()
                } else {
                    console::style(weight).green()
                };
                let groups = chunk.groups();
                writeln!(
                    out,
                    "  {:>4}  {}  {:>5} tests  {:>4} groups  {} .. {}",
                    console::style(chunk.number()).bold(),
                    weight,
                    chunk.test_count(),
                    groups.len(),
                    groups[0].key(),
                    groups[groups.len() - 1].key(),
                )?;
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let output = PlanOutput {
                total_chunks: chunks.len(),
                total_weight,
                target,
                chunks: chunks
                    .iter()
                    .map(|c| PlanChunk {
                        chunk: c.number(),
                        weight: c.weight(),
                        tests: c.test_count(),
                        groups: c.groups().iter().map(Group::key).collect(),
                    })
                    .collect(),
            };
            Ok(serde_json::to_string_pretty(&output)? + "\n")
        }
    }
}
