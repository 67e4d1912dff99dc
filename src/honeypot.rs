//! Honeypot field descriptors and their markup.
//!
//! A honeypot is an input a human never sees or fills in. Its wire name is an
//! encrypted random token; the five kinds only differ in how the input is
//! kept out of sight.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

/// Placeholder shown if a honeypot ever becomes visible (screen readers,
/// disabled CSS).
pub const HONEYPOT_PLACEHOLDER: &str =
    "Do not enter anything here. This field is used to tell humans from computers apart to reduce spam.";

const OFFSCREEN_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("left", "-10000px"),
    ("top", "-10000px"),
];

const ZERO_SIZE_STYLE: &[(&str, &str)] = &[
    ("width", "0"),
    ("height", "0"),
    ("padding", "0"),
    ("margin", "0"),
    ("border", "0"),
    ("opacity", "0"),
];

const HIDE_SCRIPT: &str =
    "var el = document.getElementById(uniqueId); if (el) { el.style.display = 'none'; }";

const OFFSCREEN_SCRIPT: &str = "var el = document.getElementById(uniqueId); if (el) { \
     el.style.position = 'absolute'; el.style.left = '-10000px'; el.style.top = '-10000px'; }";

/// How a honeypot is hidden from humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HoneypotKind {
    /// `type="hidden"` input.
    Hidden,
    /// Text input hidden by a script once the page has loaded.
    HiddenViaScript,
    /// Text input positioned off-screen with inline CSS.
    OffscreenCss,
    /// Text input moved off-screen by a script.
    OffscreenViaScript,
    /// Text input with zero width and height.
    ZeroSize,
}

impl HoneypotKind {
    pub const ALL: [HoneypotKind; 5] = [
        HoneypotKind::Hidden,
        HoneypotKind::HiddenViaScript,
        HoneypotKind::OffscreenCss,
        HoneypotKind::OffscreenViaScript,
        HoneypotKind::ZeroSize,
    ];

    /// Pick one of the five kinds uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL
            .choose(rng)
            .unwrap_or(&HoneypotKind::Hidden)
    }

    /// HTML `type` attribute.
    pub fn input_type(self) -> &'static str {
        match self {
            HoneypotKind::Hidden => "hidden",
            _ => "text",
        }
    }

    fn style(self) -> &'static [(&'static str, &'static str)] {
        match self {
            HoneypotKind::OffscreenCss => OFFSCREEN_STYLE,
            HoneypotKind::ZeroSize => ZERO_SIZE_STYLE,
            _ => &[],
        }
    }

    fn script_body(self) -> Option<&'static str> {
        match self {
            HoneypotKind::HiddenViaScript => Some(HIDE_SCRIPT),
            HoneypotKind::OffscreenViaScript => Some(OFFSCREEN_SCRIPT),
            _ => None,
        }
    }
}

/// One rendered honeypot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoneypotField {
    field_id: String,
    element_id: String,
    kind: HoneypotKind,
}

/// Structured form of a honeypot for non-HTML clients.
#[derive(Debug, Clone, Serialize)]
pub struct HoneypotRepr {
    pub id: String,
    pub name: String,
    pub placeholder: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javascript: Option<String>,
}

impl HoneypotField {
    /// A honeypot with the given wire name and a fresh random DOM id.
    pub fn new(field_id: impl Into<String>, kind: HoneypotKind) -> Self {
        Self {
            field_id: field_id.into(),
            element_id: format!("hf-{}", uuid::Uuid::new_v4().simple()),
            kind,
        }
    }

    /// Wire name of the input; also the id listed in the form metadata.
    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    /// DOM id, referenced by the attached script.
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn kind(&self) -> HoneypotKind {
        self.kind
    }

    /// Inline CSS, if this kind uses any.
    pub fn style(&self) -> Option<String> {
        let style = self.kind.style();
        if style.is_empty() {
            return None;
        }
        Some(
            style
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Script that hides this input once the helper reports the page loaded.
    pub fn script(&self) -> Option<String> {
        let body = self.kind.script_body()?;
        // Element ids are generated here from hex digits, but encode anyway
        // so the literal is always a valid JS string.
        let id_literal = serde_json::to_string(&self.element_id).ok()?;
        Some(format!(
            "window.HoneyForm.onLoad(function() {{ var uniqueId = {}; {} }});",
            id_literal, body
        ))
    }

    /// `<input>` tag plus the attached `<script>`, if any.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<input name="{}" type="{}" value="" id="{}" placeholder="{}" autocomplete="off" tabindex="-1""#,
            escape_attr(&self.field_id),
            self.kind.input_type(),
            escape_attr(&self.element_id),
            escape_attr(HONEYPOT_PLACEHOLDER),
        );
        if let Some(style) = self.style() {
            html.push_str(&format!(r#" style="{}""#, escape_attr(&style)));
        }
        html.push_str(" />");
        if let Some(script) = self.script() {
            html.push('\n');
            html.push_str(&format!("<script>{}</script>", script));
        }
        html
    }

    pub fn to_repr(&self) -> HoneypotRepr {
        let style = self.kind.style();
        HoneypotRepr {
            id: self.element_id.clone(),
            name: self.field_id.clone(),
            placeholder: HONEYPOT_PLACEHOLDER.to_string(),
            input_type: self.kind.input_type().to_string(),
            value: String::new(),
            style: (!style.is_empty()).then(|| {
                style
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect()
            }),
            javascript: self.script(),
        }
    }
}

/// Escape a string for use inside a double-quoted HTML attribute.
pub(crate) fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
