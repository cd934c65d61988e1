//! Asset Safe CLI
//!
//! Command-line interface for Asset Safe operations:
//! - Ask the assistant
//! - Check feature access
//! - Export legal agreements
//! - Upload files and inspect storage usage
//! - Check status

use assetsafe::assistant::{KnowledgeBase, Responder, SiteSearch};
use assetsafe::gating::{check_access, FeatureKey, SubscriptionContext, SubscriptionTier};
use assetsafe::legal::{self, AgreementType, ExportFormat, LayoutConfig, SignerMap, SignerRole};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "assetsafe-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for the Asset Safe service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the assistant a question
    Ask {
        /// Question text
        text: String,
        /// Page the question is asked from
        #[arg(short, long, default_value = "/")]
        path: String,
        /// Answer with the built-in knowledge base instead of the server
        #[arg(long)]
        local: bool,
    },

    /// Check feature access for a plan (lists every feature when none is given)
    Feature {
        /// Feature key (e.g. video_upload)
        feature: Option<String>,
        /// Subscription tier (basic, standard, premium)
        #[arg(short, long)]
        tier: Option<String>,
        /// Account is in its free trial
        #[arg(long)]
        trial: bool,
    },

    /// Export a legal agreement
    Legal {
        /// Agreement type (nda, confidentiality, offshore_addendum, contractor_pack, equity_grant)
        agreement: String,
        /// Output encoding (pdf, text)
        #[arg(short = 'e', long, default_value = "pdf")]
        encoding: String,
        /// Signer values as role.field=value (fields: name, email, location, signature, date, ack.<key>)
        #[arg(short, long = "set")]
        set: Vec<String>,
        /// Output file (default: the agreement's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a file
    Upload {
        /// Owner id
        owner: String,
        /// File to upload
        path: PathBuf,
        /// Control key used to track the request (default: file name)
        #[arg(long)]
        control_key: Option<String>,
        /// Content type (default: guessed from the extension)
        #[arg(long)]
        content_type: Option<String>,
        /// Subscription tier for the quota check
        #[arg(short, long)]
        tier: Option<String>,
    },

    /// Show storage usage for an owner
    Usage {
        /// Owner id
        owner: String,
        /// Subscription tier
        #[arg(short, long)]
        tier: Option<String>,
    },

    /// Show system status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Ask { text, path, local } => {
            let reply = if local {
                let responder = Responder::new(
                    Arc::new(KnowledgeBase::builtin()),
                    Arc::new(SiteSearch::builtin()),
                );
                responder.generate_response(&text, &path)
            } else {
                let response = client
                    .post(format!("{}/api/v1/assistant/respond", cli.api_url))
                    .json(&serde_json::json!({ "text": text, "path": path }))
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(api_error(response).await.into());
                }
                let data: serde_json::Value = response.json().await?;
                if cli.format == "json" {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                    return Ok(());
                }
                data["text"].as_str().unwrap_or_default().to_string()
            };

            println!("{}", render_links(&reply, &cli.api_url)?);
        }

        Commands::Feature {
            feature,
            tier,
            trial,
        } => {
            let tier = tier.as_deref().map(str::parse::<SubscriptionTier>).transpose()?;
            let context = SubscriptionContext::new(tier, trial);

            let keys: Vec<FeatureKey> = match feature {
                Some(name) => vec![name.parse()?],
                None => FeatureKey::all().to_vec(),
            };
            let decisions: Vec<_> = keys.into_iter().map(|k| check_access(k, &context)).collect();

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&decisions)?);
            } else {
                println!("{:<22} {:<22} {}", "Feature", "Requires", "Access");
                println!("{}", "-".repeat(54));
                for decision in &decisions {
                    println!(
                        "{:<22} {:<22} {}",
                        decision.feature.key.as_str(),
                        decision.feature.required_tier.display_name(),
                        if decision.has_access { "yes" } else { "upgrade" }
                    );
                }
            }
        }

        Commands::Legal {
            agreement,
            encoding,
            set,
            output,
        } => {
            let agreement: AgreementType = agreement.parse()?;
            let format: ExportFormat = encoding.parse()?;
            let signers = parse_signers(&set)?;

            let document = legal::export(agreement, &signers, format, &LayoutConfig::default())?;
            let output = output.unwrap_or_else(|| PathBuf::from(&document.file_name));
            std::fs::write(&output, &document.bytes)?;

            println!(
                "Wrote {} ({} pages, {} bytes)",
                output.display(),
                document.page_count,
                document.bytes.len()
            );
        }

        Commands::Upload {
            owner,
            path,
            control_key,
            content_type,
            tier,
        } => {
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            let tier = tier.as_deref().map(str::parse::<SubscriptionTier>).transpose()?;

            let body = serde_json::json!({
                "owner_id": owner,
                "control_key": control_key.unwrap_or_else(|| file_name.clone()),
                "file_name": file_name,
                "content_type": content_type.unwrap_or_else(|| guess_content_type(&path).to_string()),
                "tier": tier,
                "data_base64": STANDARD.encode(&bytes),
            });

            let response = client
                .post(format!("{}/api/v1/uploads", cli.api_url))
                .json(&body)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(api_error(response).await.into());
            }
            let data: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!(
                    "Uploaded {} as {} ({})",
                    data["file_name"].as_str().unwrap_or("-"),
                    data["id"].as_str().unwrap_or("-"),
                    data["category"].as_str().unwrap_or("-")
                );
                println!("URL: {}", data["public_url"].as_str().unwrap_or("-"));
            }
        }

        Commands::Usage { owner, tier } => {
            let mut url = format!(
                "{}/api/v1/owners/{}/usage",
                cli.api_url,
                urlencoding::encode(&owner)
            );
            if let Some(tier) = tier {
                url.push_str(&format!("?tier={}", urlencoding::encode(&tier)));
            }

            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(api_error(response).await.into());
            }
            let data: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let used = data["used_bytes"].as_u64().unwrap_or(0);
                let quota = data["quota_bytes"].as_u64().unwrap_or(0);
                println!(
                    "Used {} of {} ({:.2}%)",
                    assetsafe::storage::format_bytes(used),
                    assetsafe::storage::format_bytes(quota),
                    data["percent_used"].as_f64().unwrap_or(0.0)
                );
                println!();
                println!("{:<12} {:>8} {:>12}", "Category", "Files", "Size");
                println!("{}", "-".repeat(34));
                for category in data["categories"].as_array().into_iter().flatten() {
                    println!(
                        "{:<12} {:>8} {:>12}",
                        category["category"].as_str().unwrap_or("-"),
                        category["count"].as_u64().unwrap_or(0),
                        assetsafe::storage::format_bytes(category["bytes"].as_u64().unwrap_or(0))
                    );
                }
            }
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.api_url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Asset Safe v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!(
                        "Database: {}",
                        health["database"].as_str().unwrap_or("unknown")
                    );
                    if let Some(sessions) = health["chat_sessions"].as_u64() {
                        println!("Chat sessions: {}", sessions);
                    }

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Asset Safe API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the API server is running:");
                    eprintln!("  cargo run --bin assetsafe");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = assetsafe::config::generate_default_config();

            if let Some(path) = output {
                std::fs::write(&path, &config)?;
                println!("Config written to {:?}", path);
            } else {
                print!("{}", config);
            }
        }
    }

    Ok(())
}

/// Error message from an API error response
async fn api_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body["error"]["message"].as_str().unwrap_or("request failed");
    format!("Failed ({}): {}", status, message)
}

/// Parse `role.field=value` assignments into signer fields
fn parse_signers(assignments: &[String]) -> Result<SignerMap, String> {
    let mut signers = SignerMap::new();

    for assignment in assignments {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Expected role.field=value, got '{}'", assignment))?;
        let (role, field) = key
            .split_once('.')
            .ok_or_else(|| format!("Expected role.field, got '{}'", key))?;

        let role: SignerRole = role.parse()?;
        let fields = signers.entry(role).or_default();
        let value = value.to_string();

        match field {
            "name" => fields.name = Some(value),
            "email" => fields.email = Some(value),
            "location" => fields.location = Some(value),
            "signature" => fields.signature_text = Some(value),
            "date" => fields.signature_date = Some(value),
            other => match other.strip_prefix("ack.") {
                Some(ack) => {
                    let checked = matches!(value.as_str(), "true" | "yes" | "1");
                    fields.acknowledgments.insert(ack.to_string(), checked);
                }
                None => return Err(format!("Unknown signer field: {}", other)),
            },
        }
    }

    Ok(signers)
}

/// Rewrite `[title](/path)` links as `title <base/path>` for the terminal
fn render_links(text: &str, base_url: &str) -> Result<String, regex::Error> {
    let re = regex::Regex::new(r"\[([^\]]+)\]\((/[^)]*)\)")?;
    let base = base_url.trim_end_matches('/');
    Ok(re
        .replace_all(text, |caps: &regex::Captures| {
            format!("{} <{}{}>", &caps[1], base, &caps[2])
        })
        .into_owned())
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn format_duration(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
