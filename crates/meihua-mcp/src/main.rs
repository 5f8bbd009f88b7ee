use meihua_core::{
    format, method::METHOD, DivinationResolver, KnowledgeBase, Locale, Settings,
    SharedKnowledgeBase, SymbolicKnowledge,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DeriveRequest {
    /// First number, selects the lower trigram (divided by 8)
    n1: i64,
    /// Second number, selects the upper trigram (divided by 8)
    n2: i64,
    /// Third number, selects the changing line (divided by 6)
    n3: i64,
    /// Language of the summary sentence: "english" or "chinese". Defaults to the configured locale.
    locale: Option<Locale>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct GetHexagramRequest {
    /// Six-character binary code, lower trigram first (e.g. "111000")
    code: Option<String>,
    /// Ordinal position 1..=64
    position: Option<u8>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct GetLineRequest {
    /// Ordinal position of the hexagram, 1..=64
    hexagram_position: u8,
    /// Line position 1..=6, or 7 for the all-changing line of Qian/Kun
    line_position: u8,
}

// --- Server ---

#[derive(Clone)]
pub struct MeihuaServer {
    knowledge: Arc<SharedKnowledgeBase>,
    data_dir: PathBuf,
    settings: Settings,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MeihuaServer {
    /// Load settings and reference data from `data_dir`. A missing or invalid
    /// table leaves the server running on an empty one; `reload_knowledge_base`
    /// picks it up later.
    pub fn new(data_dir: PathBuf) -> Self {
        let settings = meihua_core::read_settings_in(&data_dir);
        let kb = meihua_core::load_knowledge_base_in(&data_dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "starting with an empty knowledge base");
            KnowledgeBase::default()
        });
        Self {
            knowledge: Arc::new(SharedKnowledgeBase::new(kb)),
            data_dir,
            settings,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Derive a Plum Blossom reading from three positive integers. Returns the summary sentence, a step-by-step breakdown (remainders, trigram bits, primary/secondary codes, changing line) and the full result as JSON."
    )]
    fn derive(
        &self,
        Parameters(req): Parameters<DeriveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kb = self.knowledge.snapshot();
        let resolver =
            DivinationResolver::new(kb).with_locale(req.locale.unwrap_or(self.settings.locale));
        match resolver.derive(req.n1, req.n2, req.n3) {
            Ok(result) => {
                let json = serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|e| format!("Serialization error: {}", e));
                let text = format!("{}\n{}", format::render_report(&result), json);
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                tracing::warn!(n1 = req.n1, n2 = req.n2, n3 = req.n3, error = %e, "derivation failed");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Derivation failed: {}",
                    e
                ))]))
            }
        }
    }

    #[tool(
        description = "Get one hexagram and its lines, by binary code or by ordinal position. Exactly one of `code` or `position` must be given."
    )]
    fn get_hexagram(
        &self,
        Parameters(req): Parameters<GetHexagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kb = self.knowledge.snapshot();
        let hexagram = match (&req.code, req.position) {
            (Some(code), None) => kb.find_hexagram_by_code(code).map_err(|e| e.to_string()),
            (None, Some(position)) => kb
                .find_hexagram_by_position(position)
                .ok_or_else(|| format!("no hexagram at position {}", position)),
            _ => Err("Pass exactly one of `code` or `position`".to_string()),
        };
        match hexagram {
            Ok(h) => {
                let lines: Vec<_> = kb.lines_of(h.position).collect();
                let val = serde_json::json!({ "hexagram": h, "lines": lines });
                let json = serde_json::to_string_pretty(&val)
                    .unwrap_or_else(|e| format!("Serialization error: {}", e));
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e)])),
        }
    }

    #[tool(description = "Get one line (yao) of a hexagram by the hexagram's ordinal position and the line position")]
    fn get_line(
        &self,
        Parameters(req): Parameters<GetLineRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kb = self.knowledge.snapshot();
        match kb.find_line(req.hexagram_position, req.line_position) {
            Ok(line) => {
                let json = serde_json::to_string_pretty(line)
                    .unwrap_or_else(|e| format!("Serialization error: {}", e));
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(description = "List all hexagrams in ordinal order with their binary codes")]
    fn list_hexagrams(&self) -> Result<CallToolResult, McpError> {
        let kb = self.knowledge.snapshot();
        let text = if kb.hexagram_count() == 0 {
            format!(
                "No hexagrams loaded. Run `meihua-mcp seed` or add hexagrams.json/lines.json to {} and call reload_knowledge_base.",
                self.data_dir.display()
            )
        } else {
            kb.hexagrams()
                .map(|h| format!("{}. {} [{}]", h.position, h.name, h.binary_code))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Check the loaded reference data for gaps: binary codes no hexagram carries and hexagrams missing any of lines 1-6. Any gap means some derivations will fail."
    )]
    fn audit_knowledge_base(&self) -> Result<CallToolResult, McpError> {
        let report = self.knowledge.snapshot().audit();
        let headline = if report.is_complete() {
            format!(
                "Complete: {} hexagrams, {} lines.",
                report.hexagrams, report.lines
            )
        } else {
            format!(
                "Incomplete: {} missing codes, {} hexagrams with missing lines.",
                report.missing_codes.len(),
                report.incomplete_hexagrams.len()
            )
        };
        let json = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|e| format!("Serialization error: {}", e));
        Ok(CallToolResult::success(vec![Content::text(format!(
            "{}\n{}",
            headline, json
        ))]))
    }

    #[tool(
        description = "Re-read hexagrams.json and lines.json from the data directory and swap them in. On failure the previous data stays active."
    )]
    fn reload_knowledge_base(&self) -> Result<CallToolResult, McpError> {
        match meihua_core::load_knowledge_base_in(&self.data_dir) {
            Ok(kb) => {
                let text = format!(
                    "Reloaded {} hexagrams and {} lines from {}",
                    kb.hexagram_count(),
                    kb.line_count(),
                    self.data_dir.display()
                );
                self.knowledge.replace(kb);
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                tracing::error!(error = %e, "reload failed");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Reload failed, keeping previous data: {}",
                    e
                ))]))
            }
        }
    }

    #[tool(description = "Get the Plum Blossom derivation rules used by the derive tool")]
    fn get_method(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(METHOD)]))
    }
}

#[tool_handler]
impl ServerHandler for MeihuaServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!("{}\n\n## Method\n{}", INSTRUCTIONS, METHOD);
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"Meihua derives Plum Blossom (梅花易数) readings from three numbers.

## Tools
- `derive` takes three positive integers and returns the primary hexagram (本卦), the secondary hexagram (之卦) and the changing line (变爻).
- `get_hexagram`, `get_line` and `list_hexagrams` read the reference data.
- `audit_knowledge_base` reports gaps in the reference data; `reload_knowledge_base` picks up edits on disk.

## Notes
Quote the `derive` summary sentence verbatim when presenting a reading. A "not found" error means the reference data is incomplete; do not guess a hexagram."#;

fn init_tracing() {
    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Handle `meihua-mcp seed [--force]` subcommand
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("seed") {
        let force = args.iter().any(|a| a == "--force");
        return seed(force);
    }

    let data_dir = meihua_core::data_dir();
    tracing::info!(dir = %data_dir.display(), "starting meihua-mcp");
    let service = MeihuaServer::new(data_dir)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

/// Write the built-in reference tables into the data directory.
fn seed(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = meihua_core::data_dir();
    if meihua_core::seed_store_in(&dir, force)? {
        eprintln!("Wrote reference data to {}", dir.display());
    } else {
        eprintln!(
            "Reference data already exists in {}. Re-run with --force to overwrite.",
            dir.display()
        );
    }
    Ok(())
}
