//! Terminal rendering for pipeline and shaped results.
//!
//! The answer goes to stdout so `ask` pipes cleanly; the trace, graph, and
//! table are decoration and go to stderr.

use colored::{ColoredString, Colorize};

use vulngraph_pipeline::PipelineResult;
use vulngraph_shape::{GraphView, Severity, ShapedResult, TableView};

pub(crate) fn print_pipeline_result(result: &PipelineResult) {
    println!("{}", result.answer);

    eprintln!();
    eprintln!("{}", "Trace".bold());
    for step in &result.reasoning {
        eprintln!("  {} {}", "→".cyan(), step.step.bold());
        for line in step.details.lines() {
            eprintln!("    {}", line.dimmed());
        }
    }

    if let Some(query) = &result.query {
        eprintln!();
        eprintln!("{}", "Query".bold());
        for line in query.lines() {
            eprintln!("  {line}");
        }
    }
}

pub(crate) fn print_shaped(shaped: &ShapedResult) {
    match shaped {
        ShapedResult::Empty => {
            eprintln!();
            eprintln!("{}", "no rows returned".dimmed());
        }
        ShapedResult::Graph { graph, table } => {
            print_graph(graph);
            print_table(table);
        }
        ShapedResult::Table { table } => print_table(table),
    }
}

fn print_graph(graph: &GraphView) {
    eprintln!();
    eprintln!(
        "{} ({} nodes, {} edges)",
        "Graph".bold(),
        graph.nodes.len(),
        graph.edges.len()
    );
    for node in &graph.nodes {
        match node.severity {
            Some(severity) => eprintln!(
                "  {} {} [{}] ({})",
                "•".cyan(),
                node.display_name,
                severity_colored(severity),
                node.type_label
            ),
            None => eprintln!(
                "  {} {} ({})",
                "•".cyan(),
                node.display_name,
                node.type_label
            ),
        }
    }
    for edge in &graph.edges {
        eprintln!(
            "  {} {} -[{}]-> {}",
            "→".cyan(),
            edge.source,
            edge.rel_type,
            edge.target
        );
    }
}

fn print_table(table: &TableView) {
    eprintln!();
    eprintln!("{} ({} rows)", "Table".bold(), table.rows.len());
    eprintln!("  {}", table.columns.join(" | ").bold());
    for row in &table.rows {
        eprintln!("  {}", row.join(" | "));
    }
}

fn severity_colored(severity: Severity) -> ColoredString {
    let text = severity.as_str();
    match severity {
        Severity::Critical => text.red().bold(),
        Severity::High => text.red(),
        Severity::Medium => text.yellow(),
        Severity::Low => text.green(),
        Severity::Info => text.cyan(),
    }
}
