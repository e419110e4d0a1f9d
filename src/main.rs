//! `fetch` - a content-aware HTTP, gRPC, and WebSocket client
//!
//! Wires the CLI surface to the request pipeline: parse flags, load and
//! validate configuration, dispatch to the HTTP, gRPC, WebSocket, or
//! TLS-inspection path, then classify, format, and emit the response
//! body, finally translating the outcome into a process exit code.

use anyhow::{anyhow, Context, Result};
use fetch::cli::{Cli, FormatMode};
use fetch::config::{BodySource, Config, Verbosity};
use fetch::error::FetchError;
use fetch::format;
use fetch::output::{filename_from_content_disposition, Destination};
use fetch::printer::color::{ColorMode, Style};
use fetch::printer::Printer;
use fetch::progress::{timing::render_waterfall, Progress, TimingSpans};
use fetch::request::executor::apply_auth;
use fetch::request::{exit_code_for_status, Executor, RequestPlan};
use fetch::response::classify::classify;
use fetch::response::envelope::ResponseEnvelope;
use fetch::{grpc, tls, ws};
use futures_util::StreamExt;
use std::io::Write as _;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(Verbosity::from_count(cli.verbose));

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            report_error(&err);
            let code = err
                .downcast_ref::<FetchError>()
                .map(FetchError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

fn init_tracing(verbosity: Verbosity) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.default_env_filter()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report_error(err: &anyhow::Error) {
    let mode = ColorMode::resolve(ColorMode::Auto, fetch::printer::color::stderr_is_terminal());
    let mut stderr = Printer::new(std::io::stderr(), mode);
    let _ = stderr.push_style(Style::Red);
    let _ = stderr.write_str(&format!("error: {err}"));
    let _ = stderr.pop_style();
    let _ = stderr.newline();
    if let Some(fetch_err) = err.downcast_ref::<FetchError>() {
        if let Some(hint) = fetch_err.insecure_hint() {
            let _ = stderr.write_str(&format!(
                "hint: retry with --insecure to bypass this TLS check ({hint:?})\n"
            ));
        }
    }
    let _ = stderr.flush();
}

/// Top-level dispatch: TLS inspection, WebSocket duplex, gRPC, or plain
/// HTTP, in that order of precedence.
async fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(&cli)?;
    config.validate(&cli)?;

    if config.dry_run {
        return run_dry(&config);
    }

    let url = url::Url::parse(&config.url).context("parsing request URL")?;

    if config.tls.inspect_only {
        return run_inspect_tls(&config, &url).await;
    }

    if matches!(url.scheme(), "ws" | "wss") {
        return run_websocket(&config, &url).await;
    }

    if config.grpc.enabled {
        return run_grpc(&config).await;
    }

    run_http(&config).await
}

/// `--dry-run`: prints the resolved method/URL/headers without sending
/// anything.
fn run_dry(config: &Config) -> Result<i32> {
    let plan = RequestPlan::from_config(config)?;
    println!("{} {}", plan.method, plan.url);
    for (k, v) in &plan.headers {
        println!("{k}: {v}");
    }
    Ok(0)
}

async fn run_inspect_tls(config: &Config, url: &url::Url) -> Result<i32> {
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!(FetchError::Usage("URL has no host".to_string())))?
        .to_string();
    let port = url.port_or_known_default().unwrap_or(443);

    let assembly = tls::TlsAssembly {
        ca_certs: config.tls.ca_certs.clone(),
        client_identity: config.tls.cert.clone().map(|c| (c, config.tls.key.clone())),
        min_version: config.tls.min_version,
        insecure: config.tls.insecure,
        http_version: config.network.http_version,
    };
    let tls_config = assembly.build()?;
    let connector = tokio_rustls::TlsConnector::from(std::sync::Arc::new(tls_config));

    let tcp = tokio::net::TcpStream::connect((host.as_str(), port))
        .await
        .map_err(|e| anyhow!(FetchError::Transport(format!("connecting to {host}:{port}: {e}"))))?;
    let server_name = rustls::pki_types::ServerName::try_from(host.clone())
        .map_err(|_| anyhow!(FetchError::Usage(format!("invalid TLS server name: {host}"))))?;

    let stream = connector.connect(server_name, tcp).await.map_err(|e| {
        let message = e.to_string();
        let hint = tls::classify_tls_error(&message);
        anyhow!(FetchError::Tls { message, hint })
    })?;

    let (_, session) = stream.get_ref();
    let der_chain: Vec<Vec<u8>> = session
        .peer_certificates()
        .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
        .unwrap_or_default();

    let mode = ColorMode::resolve(ColorMode::Auto, fetch::printer::color::stdout_is_terminal());
    let mut printer = Printer::new(std::io::stdout(), mode);
    let now = chrono::Utc::now().timestamp();
    tls::inspect::render_chain(&mut printer, &der_chain, now)?;
    printer.flush()?;
    Ok(0)
}

async fn run_websocket(config: &Config, url: &url::Url) -> Result<i32> {
    let method = config.method.as_deref().unwrap_or("GET");
    if ws::should_coerce_to_get(method, url) {
        warn!(%method, "non-GET method is not meaningful against a ws(s):// URL, coercing to GET");
    }

    let initial_data = initial_body_bytes(&config.body)?;
    let destination_is_tty = fetch::printer::color::stdout_is_terminal();
    let format_on = match config.format {
        FormatMode::Off => false,
        FormatMode::On => true,
        FormatMode::Auto => destination_is_tty,
    };

    ws::run(url.as_str(), initial_data, format_on).await?;
    Ok(0)
}

fn initial_body_bytes(body: &BodySource) -> Result<Option<Vec<u8>>> {
    Ok(match body {
        BodySource::None | BodySource::Stdin => None,
        BodySource::Raw(s) | BodySource::Json(s) | BodySource::Xml(s) => Some(s.clone().into_bytes()),
        BodySource::File(path) => Some(
            std::fs::read(path).with_context(|| format!("reading body file {}", path.display()))?,
        ),
        BodySource::Form(_) | BodySource::Multipart(_) => None,
    })
}

async fn run_grpc(config: &Config) -> Result<i32> {
    let mut plan = RequestPlan::from_config(config)?;
    if config.method.is_none() {
        plan.method = "POST".to_string();
    }
    if !plan.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
        plan.headers.push(("content-type".to_string(), "application/grpc".to_string()));
    }
    plan.headers.push(("te".to_string(), "trailers".to_string()));

    let raw_body = plan.body.bytes().ok();
    let frames = grpc::frame_request_body(&config.body, raw_body.as_deref())?;
    let framed: Vec<u8> = frames.into_iter().flatten().collect();
    plan.body = fetch::request::BodyProvider::Memory(framed);

    apply_auth(config, &mut plan)?;

    let mut executor = Executor::new(config).await?;
    let envelope = executor.run(plan, config).await?;
    let status = envelope.status;
    let headers = envelope.headers.clone();
    let (_, body) = envelope.buffer_body().await?;

    let mut response_frames = Vec::new();
    let mut offset = 0usize;
    while let Some((frame, consumed)) = grpc::read_frame(&body[offset..])? {
        response_frames.push(frame.encode());
        offset += consumed;
    }

    let mode = ColorMode::resolve(ColorMode::Auto, fetch::printer::color::stdout_is_terminal());
    let mut printer = Printer::new(std::io::stdout(), mode);
    grpc::render_stream(&mut printer, &response_frames, &headers)?;
    printer.flush()?;

    Ok(exit_code_for_status(status, config.ignore_status))
}

async fn run_http(config: &Config) -> Result<i32> {
    let mut plan = RequestPlan::from_config(config)?;
    apply_range_header(&mut plan, config);
    apply_auth(config, &mut plan)?;

    let mut executor = Executor::new(config).await?;
    let started = Instant::now();
    let envelope = executor.run(plan, config).await?;

    let destination = resolve_destination(config, &envelope)?;
    let destination_is_tty = destination.is_tty();

    let (envelope, body) = buffer_with_progress(envelope).await?;
    let elapsed = started.elapsed();

    if config.timing {
        let spans = TimingSpans {
            body: elapsed,
            ..Default::default()
        };
        let mode = ColorMode::resolve(ColorMode::Auto, fetch::printer::color::stderr_is_terminal());
        let mut stderr = Printer::new(std::io::stderr(), mode);
        render_waterfall(&mut stderr, &spans, 1)?;
        stderr.flush()?;
    }

    let sniff_len = body.len().min(1024);
    let (content_type, _charset) = classify(&envelope.headers, &body[..sniff_len]);
    let attempt_format = format::should_format(config.format, destination_is_tty, content_type);

    let color_mode = ColorMode::resolve(ColorMode::Auto, destination_is_tty);
    let mut rendered = Vec::new();
    let formatted = if attempt_format {
        let mut printer = Printer::new(&mut rendered, color_mode);
        format::dispatch_buffered(&mut printer, content_type, &body).is_ok()
    } else {
        false
    };
    let final_bytes: &[u8] = if formatted { &rendered } else { &body };

    if config.output.copy_to_clipboard {
        warn!("--copy was requested but this build has no clipboard backend; skipping");
    }

    write_output(config, &destination, final_bytes, destination_is_tty)?;

    Ok(exit_code_for_status(envelope.status, config.ignore_status))
}

fn apply_range_header(plan: &mut RequestPlan, config: &Config) {
    if config.range.is_empty() {
        return;
    }
    plan.headers.push(("Range".to_string(), config.range.join(",")));
}

fn resolve_destination(config: &Config, envelope: &ResponseEnvelope) -> Result<Destination> {
    if let Some(path) = &config.output.path {
        if path == "-" {
            return Ok(Destination::Stdout);
        }
        return Ok(Destination::File {
            path: path.into(),
            clobber: config.output.clobber,
        });
    }
    if config.output.auto_name {
        let name = if config.output.use_content_disposition {
            envelope
                .headers
                .get_first("content-disposition")
                .and_then(filename_from_content_disposition)
        } else {
            None
        }
        .or_else(|| url::Url::parse(&config.url).ok().and_then(url_basename))
        .unwrap_or_else(|| "download".to_string());
        return Ok(Destination::File {
            path: name.into(),
            clobber: config.output.clobber,
        });
    }
    Ok(Destination::Stdout)
}

fn url_basename(url: url::Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Writes `bytes` to `destination`, paging through `$PAGER` (falling back
/// to `less -FRX`) when writing to an interactive stdout and paging
/// hasn't been suppressed.
fn write_output(config: &Config, destination: &Destination, bytes: &[u8], is_tty: bool) -> Result<()> {
    if matches!(destination, Destination::Stdout) && is_tty && !config.output.no_pager && bytes.len() > 4096 {
        if page_through(bytes).is_ok() {
            return Ok(());
        }
    }
    destination.write_all(bytes)?;
    Ok(())
}

fn page_through(bytes: &[u8]) -> std::io::Result<()> {
    let pager = std::env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let mut parts = pager.split_whitespace();
    let program = parts.next().unwrap_or("less");
    let mut command = std::process::Command::new(program);
    command.args(parts);
    if program == "less" {
        command.arg("-FRX");
    }
    let mut child = command.stdin(std::process::Stdio::piped()).spawn()?;
    child.stdin.take().unwrap().write_all(bytes)?;
    child.wait()?;
    Ok(())
}

/// Drains the response body while feeding a stderr progress indicator,
/// sized from `Content-Length` when present.
async fn buffer_with_progress(mut envelope: ResponseEnvelope) -> Result<(ResponseEnvelope, Vec<u8>)> {
    let total = envelope
        .headers
        .get_first("content-length")
        .and_then(|v| v.parse::<u64>().ok());
    let mut progress = Progress::new(total);
    let mut buf = Vec::new();
    while let Some(chunk) = envelope.body.next().await {
        let chunk = chunk.map_err(|e| anyhow!(FetchError::Transport(e.to_string())))?;
        progress.advance(chunk.len() as u64);
        buf.extend_from_slice(&chunk);
    }
    progress.finish();
    envelope.body = Box::pin(futures_util::stream::empty());
    Ok((envelope, buf))
}
