//! Command implementations. Each returns the text to print on stdout.

use crate::cli::{Commands, OutputFormat};
use anyhow::{Context, Result};
use queryir::{
    FlattenPatterns, QueryRenderer, QueryStatement, RenderConfig, SimplifyPaths, SparqlRenderer,
    SqlRenderer, TransformPipeline, WireCodec,
};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Run one subcommand
pub fn execute(command: Commands, config_path: Option<PathBuf>) -> Result<String> {
    match command {
        Commands::Render {
            input,
            format,
            prefixes,
            no_prologue,
        } => {
            let statement = load_statement(&input)?;
            let mut config = load_config(config_path.as_deref())?;
            for declaration in &prefixes {
                config.apply_prefix_override(declaration)?;
            }
            if no_prologue {
                config.emit_prologue = false;
            }
            render(&statement, format, &config)
        }
        Commands::Analyze { input } => analyze(&load_statement(&input)?),
        Commands::Rewrite {
            input,
            flatten,
            simplify_paths,
            pretty,
        } => rewrite(load_statement(&input)?, flatten, simplify_paths, pretty),
        Commands::Classify { input } => Ok(classify(&load_statement(&input)?)),
    }
}

/// Read a file, or stdin for `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn load_statement(path: &Path) -> Result<QueryStatement> {
    let text = read_input(path)?;
    let statement = QueryStatement::decode_str(&text)
        .with_context(|| format!("invalid statement in {}", path.display()))?;
    debug!(statement = statement.name(), "decoded statement");
    Ok(statement)
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => Ok(RenderConfig::load(path)?),
        None => Ok(RenderConfig::default()),
    }
}

pub fn render(
    statement: &QueryStatement,
    format: OutputFormat,
    config: &RenderConfig,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Sparql => SparqlRenderer::from_config(config).render(statement)?,
        OutputFormat::Sql => SqlRenderer.render(statement)?,
    };
    Ok(rendered.text)
}

/// JSON report of the statement's patterns
pub fn analyze(statement: &QueryStatement) -> Result<String> {
    let patterns: Vec<_> = statement
        .patterns()
        .iter()
        .map(|pattern| {
            json!({
                "variables": pattern.variables(),
                "requiredVariables": pattern.required_variables(),
                "complexity": pattern.complexity(),
            })
        })
        .collect();
    let report = json!({
        "statement": statement.name(),
        "kind": statement.kind().as_str(),
        "patterns": patterns,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn rewrite(
    statement: QueryStatement,
    flatten: bool,
    simplify_paths: bool,
    pretty: bool,
) -> Result<String> {
    let pipeline = TransformPipeline::builder()
        .with_if(flatten, FlattenPatterns)
        .with_if(simplify_paths, SimplifyPaths)
        .build();
    let rewritten = pipeline.run(statement);
    let value = rewritten.encode()?;
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

pub fn classify(statement: &QueryStatement) -> String {
    format!("{}\t{}", statement.name(), statement.kind().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ASK: &str = r#"{
        "tag": "ask",
        "pattern": {
            "tag": "join",
            "lhs": {"tag": "basic", "triples": [{
                "subject": {"tag": "variable", "name": "a"},
                "predicate": {"tag": "iri", "value": "http://ex/p"},
                "object": {"tag": "variable", "name": "b"}
            }]},
            "rhs": {"tag": "basic", "triples": [{
                "subject": {"tag": "variable", "name": "b"},
                "predicate": {"tag": "iri", "value": "http://ex/p"},
                "object": {"tag": "variable", "name": "c"}
            }]}
        }
    }"#;

    const DELETE: &str = r#"{"tag": "delete", "table": {"name": "users"}}"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn statement(text: &str) -> QueryStatement {
        QueryStatement::decode_str(text).unwrap()
    }

    #[test]
    fn test_render_sparql_with_prefix_override() {
        let file = write_temp(ASK);
        let output = execute(
            Commands::Render {
                input: file.path().to_path_buf(),
                format: OutputFormat::Sparql,
                prefixes: vec!["ex=http://ex/".to_string()],
                no_prologue: true,
            },
            None,
        )
        .unwrap();
        assert_eq!(output, "ASK {\n  ?a ex:p ?b .\n  ?b ex:p ?c .\n}");
    }

    #[test]
    fn test_render_with_config_file() {
        let input = write_temp(ASK);
        let config = write_temp("standard_prefixes = false\n[prefixes]\nex = \"http://ex/\"\n");
        let output = execute(
            Commands::Render {
                input: input.path().to_path_buf(),
                format: OutputFormat::Sparql,
                prefixes: vec![],
                no_prologue: false,
            },
            Some(config.path().to_path_buf()),
        )
        .unwrap();
        assert!(output.starts_with("PREFIX ex: <http://ex/>\n\nASK {"));
    }

    #[test]
    fn test_render_sql_only_statement_as_sparql_fails() {
        let err = render(
            &statement(DELETE),
            OutputFormat::Sparql,
            &RenderConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "sparql cannot render delete statements");
        assert_eq!(
            render(&statement(DELETE), OutputFormat::Sql, &RenderConfig::default()).unwrap(),
            "DELETE FROM users"
        );
    }

    #[test]
    fn test_bad_prefix_is_reported() {
        let file = write_temp(ASK);
        let err = execute(
            Commands::Render {
                input: file.path().to_path_buf(),
                format: OutputFormat::Sparql,
                prefixes: vec!["nonsense".to_string()],
                no_prologue: false,
            },
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nonsense"));
    }

    #[test]
    fn test_analyze_report() {
        let report: serde_json::Value =
            serde_json::from_str(&analyze(&statement(ASK)).unwrap()).unwrap();
        assert_eq!(report["statement"], "ask");
        assert_eq!(report["kind"], "read-only");
        assert_eq!(report["patterns"][0]["variables"], json!(["a", "b", "c"]));
        assert_eq!(report["patterns"][0]["requiredVariables"], json!(["a", "b", "c"]));
        assert_eq!(report["patterns"][0]["complexity"], json!(100.0));
    }

    #[test]
    fn test_rewrite_flatten() {
        let output = rewrite(statement(ASK), true, false, false).unwrap();
        let rewritten = statement(&output);
        let QueryStatement::Ask(ask) = rewritten else {
            panic!("expected ask");
        };
        assert!(matches!(
            ask.pattern,
            queryir::GraphPattern::Basic { ref triples } if triples.len() == 2
        ));
    }

    #[test]
    fn test_rewrite_without_flags_is_identity() {
        let output = rewrite(statement(ASK), false, false, true).unwrap();
        assert_eq!(statement(&output), statement(ASK));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&statement(ASK)), "ask\tread-only");
        assert_eq!(classify(&statement(DELETE)), "delete\tmodification");
    }

    #[test]
    fn test_missing_input_has_context() {
        let err = load_statement(Path::new("/nonexistent/query.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/query.json"));
    }

    #[test]
    fn test_invalid_document_has_context() {
        let file = write_temp(r#"{"tag": "upsert"}"#);
        let err = load_statement(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("invalid statement in"));
        assert_eq!(
            err.root_cause().to_string(),
            "QueryStatement: unknown tag `upsert`"
        );
    }
}
