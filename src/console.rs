//! Line-oriented console adapter.
//!
//! Parses what the user types into commands and turns conversation and
//! search state into plain text. Markdown is printed as-is.

use crate::client::{Message, Role, SearchStats, SourceType};
use crate::search::{SearchOutcome, SearchQuery, SearchView};

/// Legal notice shown once at startup.
pub const DISCLAIMER: &str = "Important - Avertissement Légal : cet assistant est un outil d'aide à la décision pour professionnels de santé. Il ne remplace pas l'expertise d'un pharmacien diplômé. Toujours vérifier les informations critiques dans les sources officielles.";

/// Help text listing console commands.
pub const HELP: &str = "\
Commandes :
  <question>                          poser une question
  /search [--vidal|--meddispar] <q>   rechercher dans les bases
  /clear                              effacer la conversation
  /stats                              statistiques de l'index
  /health                             état du service
  /help                               cette aide
  /quit                               quitter";

/// One parsed console line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    /// Question for the chat orchestrator.
    Chat(String),
    /// Search request.
    Search(SearchQuery),
    /// Reset the conversation.
    Clear,
    /// Show index statistics.
    Stats,
    /// Show service health and status.
    Health,
    /// Show help.
    Help,
    /// Leave the console.
    Quit,
    /// Unrecognized slash command or malformed arguments.
    Unknown(String),
}

/// Parse one input line.
#[must_use]
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Chat(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "search" | "s" => parse_search(args.trim()),
        "clear" => Command::Clear,
        "stats" => Command::Stats,
        "health" | "status" => Command::Health,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

fn parse_search(args: &str) -> Command {
    let (filter, text) = match args.split_once(char::is_whitespace) {
        Some(("--vidal", text)) => (Some(SourceType::Vidal), text),
        Some(("--meddispar", text)) => (Some(SourceType::Meddispar), text),
        _ if args.starts_with("--") => return Command::Unknown(format!("/search {args}")),
        _ => (None, args),
    };

    let text = text.trim();
    if text.is_empty() {
        return Command::Unknown(format!("/search {args}"));
    }

    let query = SearchQuery::new(text);
    Command::Search(match filter {
        Some(source_type) => query.with_source_type(source_type),
        None => query,
    })
}

/// Render an assistant turn with its numbered sources.
#[must_use]
pub fn format_message(message: &Message) -> String {
    let mut out = match message.role {
        Role::User => format!("> {}", message.content),
        Role::Assistant => message.content.clone(),
    };

    if !message.sources.is_empty() {
        out.push_str("\n\nSources :");
        for (i, source) in message.sources.iter().enumerate() {
            out.push_str(&format!("\n  {}. [{}] {}", i + 1, source.source_type, source.title));
            if !source.url.is_empty() {
                out.push_str(&format!(" <{}>", source.url));
            }
        }
    }

    out
}

/// Render a search outcome.
#[must_use]
pub fn format_search(outcome: &SearchOutcome) -> String {
    match outcome.view() {
        SearchView::Idle => String::new(),
        SearchView::NoResults => "Aucun résultat trouvé".to_string(),
        SearchView::Unavailable => "Recherche indisponible, veuillez réessayer.".to_string(),
        SearchView::Results => {
            let n = outcome.results.len();
            let plural = if n > 1 { "s" } else { "" };
            let mut out = format!("{n} résultat{plural} trouvé{plural}");
            for (i, result) in outcome.results.iter().enumerate() {
                out.push_str(&format!(
                    "\n\n{}. {} [{}] ({:.0}%)\n   {}",
                    i + 1,
                    result.title,
                    result.source_type,
                    result.relevance_score * 100.0,
                    result.content
                ));
                if !result.url.is_empty() {
                    out.push_str(&format!("\n   {}", result.url));
                }
            }
            out
        }
    }
}

/// Render index statistics.
#[must_use]
pub fn format_stats(stats: &SearchStats) -> String {
    let mut lines = vec![format!("Documents indexés : {}", stats.total_documents)];
    if !stats.sources.is_empty() {
        lines.push(format!("Sources : {}", stats.sources.join(", ")));
    }
    if let Some(model) = &stats.llm_model {
        lines.push(format!("Modèle : {model}"));
    }
    if let Some(model) = &stats.embedding_model {
        lines.push(format!("Embeddings : {model}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::{SearchResponse, SearchResult, Source, TransportError};

    #[test]
    fn test_parse_plain_question() {
        assert_eq!(
            parse_command("Quelles sont les indications du paracétamol ?\n"),
            Command::Chat("Quelles sont les indications du paracétamol ?".to_string())
        );
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(parse_command("/clear"), Command::Clear);
        assert_eq!(parse_command("/stats"), Command::Stats);
        assert_eq!(parse_command("/status"), Command::Health);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/help"), Command::Help);
        assert!(matches!(parse_command("/frobnicate"), Command::Unknown(_)));
    }

    #[test]
    fn test_parse_search_with_filter() {
        assert_eq!(
            parse_command("/search --vidal paracétamol codéine"),
            Command::Search(
                SearchQuery::new("paracétamol codéine").with_source_type(SourceType::Vidal)
            )
        );
        assert_eq!(
            parse_command("/search aspirine"),
            Command::Search(SearchQuery::new("aspirine"))
        );
        assert!(matches!(parse_command("/search"), Command::Unknown(_)));
        assert!(matches!(parse_command("/search --vidal"), Command::Unknown(_)));
        assert!(matches!(parse_command("/search --other x"), Command::Unknown(_)));
    }

    #[test]
    fn test_format_message_lists_sources() {
        let message = Message::assistant(
            "Antalgique et antipyrétique.",
            "2024-01-01T00:00:00Z".to_string(),
            vec![Source {
                title: "Paracétamol".to_string(),
                content: "Douleurs".to_string(),
                url: "https://www.vidal.fr/paracetamol".to_string(),
                source_type: SourceType::Vidal,
                relevance_score: 0.9,
            }],
        );
        let text = format_message(&message);
        assert!(text.starts_with("Antalgique et antipyrétique."));
        assert!(text.contains("Sources :"));
        assert!(text.contains("1. [vidal] Paracétamol <https://www.vidal.fr/paracetamol>"));
    }

    #[test]
    fn test_format_search_views() {
        assert!(format_search(&SearchOutcome::default()).is_empty());

        let empty = SearchResponse {
            query: "zzznotfound".to_string(),
            results: Vec::new(),
            total_results: 0,
        };
        assert_eq!(
            format_search(&SearchOutcome::from_response("zzznotfound", empty)),
            "Aucun résultat trouvé"
        );

        let failed = SearchOutcome::failed("aspirine", &TransportError::Timeout);
        assert!(format_search(&failed).starts_with("Recherche indisponible"));
    }

    #[test]
    fn test_format_search_results() {
        let response = SearchResponse {
            query: "aspirine".to_string(),
            results: vec![SearchResult {
                title: "Aspirine".to_string(),
                content: "Acide acétylsalicylique".to_string(),
                url: String::new(),
                source_type: "vidal".to_string(),
                relevance_score: 0.5,
            }],
            total_results: 1,
        };
        let text = format_search(&SearchOutcome::from_response("aspirine", response));
        assert!(text.starts_with("1 résultat trouvé"));
        assert!(text.contains("1. Aspirine [vidal] (50%)"));
    }

    #[test]
    fn test_format_search_plural_with_links() {
        let hit = |title: &str, url: &str| SearchResult {
            title: title.to_string(),
            content: "Extrait".to_string(),
            url: url.to_string(),
            source_type: "meddispar".to_string(),
            relevance_score: 0.25,
        };
        let response = SearchResponse {
            query: "morphine".to_string(),
            results: vec![hit("Morphine", "https://www.meddispar.fr/morphine"), hit("Codéine", "")],
            total_results: 2,
        };
        let text = format_search(&SearchOutcome::from_response("morphine", response));
        assert!(text.starts_with("2 résultats trouvés"));
        assert!(text.contains("1. Morphine [meddispar] (25%)\n   Extrait\n   https://www.meddispar.fr/morphine"));
        assert!(text.ends_with("2. Codéine [meddispar] (25%)\n   Extrait"));
    }

    #[test]
    fn test_format_stats() {
        let stats = SearchStats {
            total_documents: 1280,
            llm_model: Some("gpt-4o".to_string()),
            sources: vec!["Vidal".to_string(), "Meddispar".to_string()],
            ..SearchStats::default()
        };
        assert_eq!(
            format_stats(&stats),
            "Documents indexés : 1280\nSources : Vidal, Meddispar\nModèle : gpt-4o"
        );
    }
}
