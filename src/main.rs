//! 命令行入口：翻译一个本地 HTML 文件

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use encoding_rs::Encoding;
use markup5ever_rcdom::RcDom;
use tracing::{info, warn};

use pagetrans::env::core::{LogLevel, NoColor};
use pagetrans::env::{generate_env_docs, EnvVar};
use pagetrans::html::{get_charset, get_title, html_to_dom, serialize_document};
use pagetrans::translation::{
    translate_dom_content, ConfigManager, TranslationConfig, TranslationResult,
};

#[derive(Parser, Debug)]
#[command(name = "pagetrans")]
#[command(version, about = "Translate an HTML document in place, keeping its markup")]
struct Args {
    /// Input HTML file
    #[arg(value_name = "INPUT", required_unless_present_any = ["env_docs", "example_config"])]
    input: Option<PathBuf>,

    /// Language pair, e.g. en-fr
    #[arg(short, long, value_name = "PAIR")]
    lang: Option<String>,

    /// Translation API base URL
    #[arg(short, long, value_name = "URL")]
    api_url: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Merge lines split by <br> before translating
    #[arg(long)]
    line_merge: bool,

    /// Print supported environment variables and exit
    #[arg(long)]
    env_docs: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE")]
    example_config: Option<String>,
}

fn init_logging() {
    let level = LogLevel::get_or_default("info".to_string())
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!NoColor::get_or_default(false))
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> TranslationResult<TranslationConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.create_simple_config(args.lang.as_deref(), args.api_url.as_deref());
    config.line_merge |= args.line_merge;
    config.validate()?;
    Ok(config)
}

/// 先按 UTF-8 解析，文档声明了有效字符集时按该字符集重新解析
fn parse_document(data: &[u8]) -> io::Result<(RcDom, String)> {
    let mut document_encoding = "utf-8".to_string();
    let mut dom = html_to_dom(data, &document_encoding)?;

    if let Some(html_charset) = get_charset(&dom.document) {
        if let Some(charset) = Encoding::for_label_no_replacement(html_charset.as_bytes()) {
            if charset != encoding_rs::UTF_8 {
                document_encoding = charset.name().to_string();
                dom = html_to_dom(data, &document_encoding)?;
            }
        }
    }

    Ok((dom, document_encoding))
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(input) = args.input.as_ref() else {
        return Ok(());
    };
    let config = load_config(&args)?;

    let data = fs::read(input)?;
    let (dom, document_encoding) = parse_document(&data)?;
    info!(
        "翻译 {} ({}, {}): {}",
        input.display(),
        document_encoding,
        config.languages(),
        get_title(&dom.document).unwrap_or_default()
    );

    let summary = translate_dom_content(&dom, config).await?;
    if summary.failed_requests > 0 {
        warn!("{} 个请求被放弃，部分文本保持原文", summary.failed_requests);
    }

    let result = serialize_document(&dom, &document_encoding)?;
    match &args.output {
        Some(path) => fs::write(path, result)?,
        None => io::stdout().write_all(&result)?,
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if args.env_docs {
        println!("{}", generate_env_docs());
        return;
    }

    if let Some(path) = &args.example_config {
        if let Err(e) = ConfigManager::generate_example_config(path) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        println!("Example configuration written to {}", path);
        return;
    }

    init_logging();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
