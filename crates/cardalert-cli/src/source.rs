//! Raw message retrieval and MIME decoding.
//!
//! Extraction works on decoded body text. This module turns stored RFC 822
//! messages into that text: it parses the MIME structure, picks a text part,
//! and undoes the transfer encoding (quoted-printable, base64) and charset.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use mailparse::{parse_mail, ParsedMail};
use tracing::debug;

/// Something that can hand out decoded email bodies by message id.
pub trait MessageSource {
    /// Fetch and decode the body of `message_id`.
    fn fetch(&self, message_id: &str) -> anyhow::Result<String>;
}

/// Messages stored as files named by message id in one directory.
pub struct DirectorySource {
    root: PathBuf,
    prefer_html: bool,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefer_html: false,
        }
    }

    /// Prefer the `text/html` part over `text/plain` when both exist.
    pub fn with_prefer_html(mut self, prefer_html: bool) -> Self {
        self.prefer_html = prefer_html;
        self
    }
}

impl MessageSource for DirectorySource {
    fn fetch(&self, message_id: &str) -> anyhow::Result<String> {
        if message_id.is_empty()
            || message_id.contains(['/', '\\'])
            || message_id == "."
            || message_id == ".."
        {
            bail!("Invalid message id: {:?}", message_id);
        }

        let path = self.root.join(message_id);
        let raw = fs::read(&path)
            .with_context(|| format!("Failed to read message {}", path.display()))?;
        decode_message(&raw, self.prefer_html)
    }
}

/// Decode a raw RFC 822 message to the text of its best body part.
pub fn decode_message(raw: &[u8], prefer_html: bool) -> anyhow::Result<String> {
    let mail = parse_mail(raw).context("Failed to parse message")?;

    let order = if prefer_html {
        ["text/html", "text/plain"]
    } else {
        ["text/plain", "text/html"]
    };

    for mime in order {
        if let Some(body) = find_part(&mail, mime)? {
            debug!("Using {} part ({} bytes)", mime, body.len());
            return Ok(body);
        }
    }

    Err(anyhow!("Message has no text/plain or text/html part"))
}

fn find_part(mail: &ParsedMail, mime: &str) -> anyhow::Result<Option<String>> {
    if mail.subparts.is_empty() {
        if mail.ctype.mimetype.eq_ignore_ascii_case(mime) {
            let body = mail.get_body().context("Failed to decode message body")?;
            return Ok(Some(body));
        }
        return Ok(None);
    }

    for part in &mail.subparts {
        if let Some(body) = find_part(part, mime)? {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

/// Whether a file should be read as a raw RFC 822 message.
pub fn is_raw_message(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
}

/// Read an email file, decoding it when it is a raw message.
pub fn read_email(path: &Path, raw_message: bool, prefer_html: bool) -> anyhow::Result<String> {
    if raw_message || is_raw_message(path) {
        let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        decode_message(&raw, prefer_html)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qp_message() -> String {
        [
            "From: Chase <no.reply.alerts@chase.com>",
            "Subject: Your Single Transaction Alert from Chase",
            "MIME-Version: 1.0",
            "Content-Type: text/plain; charset=\"us-ascii\"",
            "Content-Transfer-Encoding: quoted-printable",
            "",
            "Account ending in 1234. A charge of ($USD) 109.00 at Test Mer\\chant.com has been authorized on Oct =",
            "13, 2020 at 7:06 PM ET. Total =3D 109.00",
            "",
        ]
        .join("\r\n")
    }

    #[test]
    fn test_decodes_quoted_printable() {
        let body = decode_message(qp_message().as_bytes(), false).unwrap();
        assert!(body.contains("authorized on Oct 13, 2020 at"));
        assert!(body.contains("Total = 109.00"));
        assert!(body.contains("Test Mer\\chant.com"));
    }

    #[test]
    fn test_multipart_preference() {
        let raw = [
            "Subject: alert",
            "MIME-Version: 1.0",
            "Content-Type: multipart/alternative; boundary=\"XYZ\"",
            "",
            "--XYZ",
            "Content-Type: text/plain; charset=utf-8",
            "",
            "plain body",
            "--XYZ",
            "Content-Type: text/html; charset=utf-8",
            "",
            "<html><body>html body</body></html>",
            "--XYZ--",
            "",
        ]
        .join("\r\n");

        let plain = decode_message(raw.as_bytes(), false).unwrap();
        assert!(plain.contains("plain body"));

        let html = decode_message(raw.as_bytes(), true).unwrap();
        assert!(html.contains("<html><body>html body"));
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("msg-0001"), qp_message()).unwrap();

        let source = DirectorySource::new(dir.path());
        let body = source.fetch("msg-0001").unwrap();
        assert!(body.contains("ending in 1234"));

        assert!(source.fetch("missing").is_err());
        assert!(source.fetch("../msg-0001").is_err());
        assert!(source.fetch("").is_err());
    }

    #[test]
    fn test_is_raw_message() {
        assert!(is_raw_message(Path::new("alerts/one.eml")));
        assert!(is_raw_message(Path::new("alerts/ONE.EML")));
        assert!(!is_raw_message(Path::new("alerts/one.txt")));
        assert!(!is_raw_message(Path::new("alerts/one")));
    }
}
