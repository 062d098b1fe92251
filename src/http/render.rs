//! HTML dashboard fragment
//!
//! Meant to be embedded in an iframe, so the page background is transparent
//! and only the inner cards are styled.

use std::fmt::Write;
use crate::status::StatusSnapshot;

const DOT_OK: &str = "#22c55e";
const DOT_DOWN: &str = "#ef4444";

const STYLE: &str = r#"
      * { box-sizing: border-box; }
      html, body {
        margin: 0;
        padding: 0;
        background: transparent;
        color: var(--text);
        font-family: system-ui, -apple-system, Segoe UI, Roboto, Ubuntu, Cantarell, "Helvetica Neue", Arial, sans-serif;
        color-scheme: dark;
      }
      .wrap { width: 100%; height: 100%; padding: 10px; background: transparent; }
      .header {
        display: flex;
        align-items: center;
        justify-content: space-between;
        gap: 12px;
        margin-bottom: 12px;
      }
      .title { display: flex; align-items: center; gap: 10px; min-width: 0; }
      .dot {
        width: 11px;
        height: 11px;
        border-radius: 999px;
        background: var(--dot);
        box-shadow: 0 0 0 5px rgba(34,197,94,0.10);
        flex: 0 0 auto;
      }
      .state { font-weight: 750; font-size: 16px; letter-spacing: 0.2px; white-space: nowrap; }
      .pill {
        font-size: 12px;
        color: var(--muted);
        padding: 4px 10px;
        border: 1px solid rgba(255,255,255,0.08);
        border-radius: 999px;
        white-space: nowrap;
        flex: 0 0 auto;
      }
      .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 10px; }
      .card {
        padding: 10px 12px;
        border-radius: 12px;
        background: var(--inset-bg);
        border: 1px solid var(--inset-border);
        min-width: 0;
      }
      .k { color: var(--muted); font-size: 12px; margin-bottom: 6px; }
      .v {
        font-size: 15px;
        font-weight: 700;
        line-height: 1.2;
        overflow: hidden;
        text-overflow: ellipsis;
        white-space: nowrap;
      }
      .location { grid-column: span 2; }
      .location .v {
        white-space: normal;
        overflow-wrap: anywhere;
        display: -webkit-box;
        -webkit-line-clamp: 3;
        -webkit-box-orient: vertical;
        overflow: hidden;
      }
      .meta {
        margin-top: 10px;
        color: var(--muted);
        font-size: 12px;
        display: flex;
        justify-content: space-between;
        gap: 10px;
      }
      .err {
        margin-top: 12px;
        font-size: 12px;
        color: rgba(239,68,68,0.92);
        background: rgba(239,68,68,0.08);
        border: 1px solid rgba(239,68,68,0.18);
        border-radius: 12px;
        padding: 10px 12px;
        white-space: pre-wrap;
        overflow: hidden;
        max-height: 140px;
      }
"#;

/// Render the dashboard for one snapshot
pub fn dashboard(snapshot: &StatusSnapshot, connected: bool, cache_seconds: u64) -> String {
    let status = escape(snapshot.vpn_status());
    let ip = escape(snapshot.public_ip().unwrap_or("Unknown"));
    let port = match snapshot.port_forward {
        Some(port) if port > 0 => port.to_string(),
        _ => "None/Unknown".to_string(),
    };
    let location = escape(&snapshot.location.display().unwrap_or_else(|| "Unknown".to_string()));
    let dot = if connected { DOT_OK } else { DOT_DOWN };
    let pill = if connected { "Connected" } else { "Disconnected" };
    let verdict = if connected { "OK" } else { "Not connected" };

    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>VPN Status</title>
    <style>
      :root {{
        --inset-bg: rgba(255,255,255,0.035);
        --inset-border: rgba(255,255,255,0.06);
        --text: rgba(255,255,255,0.92);
        --muted: rgba(255,255,255,0.70);
        --dot: {dot};
      }}{style}    </style>
  </head>
  <body>
    <div class="wrap">
      <div class="header">
        <div class="title">
          <div class="dot"></div>
          <div class="state">VPN: {status}</div>
        </div>
        <div class="pill">{pill}</div>
      </div>
      <div class="grid">
        <div class="card">
          <div class="k">Public IP</div>
          <div class="v">{ip}</div>
        </div>
        <div class="card">
          <div class="k">Port Forward</div>
          <div class="v">{port}</div>
        </div>
        <div class="card location">
          <div class="k">Location</div>
          <div class="v">{location}</div>
        </div>
      </div>
      <div class="meta">
        <div>Cache: {cache_seconds}s</div>
        <div>{verdict}</div>
      </div>
"#,
        style = STYLE,
    );

    if !snapshot.errors.is_empty() {
        let errors: Vec<String> = snapshot.errors.iter().map(|e| escape(e)).collect();
        let _ = write!(html, "      <div class='err'><b>Errors</b>\n{}</div>\n", errors.join("\n"));
    }

    html.push_str("    </div>\n  </body>\n</html>\n");
    html
}

/// Minimal escaping for text nodes
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
