//! KML 2.2 document builder.
//!
//! Every icon becomes a pair of `Style` elements (`normal` and `highlight`,
//! rendered identically) grouped under a `StyleMap`; every place becomes a
//! `Placemark` referencing its icon's style map. Styles are declared before
//! any placemark so each `styleUrl` resolves to an earlier declaration.
//!
//! Icons are either embedded (the icon URL, which may be a `data:` URL, is
//! used as the `href` directly) or referenced: PNG data URLs are decoded into
//! [`Attachment`]s at `images/icon-{n}.png` and the style points at that
//! relative path. Other references pass through unchanged in both modes.

use std::borrow::Cow;
use std::io;

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::data_url;
use crate::model::{Icon, IconId, MapView, Place};
use crate::number::format_float;

/// Namespace of the KML 2.2 schema.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Style variants declared for each icon, in declaration order.
const SUBSTYLES: [&str; 2] = ["normal", "highlight"];

const INDENT_SIZE: usize = 2;

/// How icon images are referenced from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconMode {
    /// Use each icon URL verbatim, including inline `data:` URLs.
    #[default]
    Embedded,
    /// Move PNG data URLs into archive attachments referenced by path.
    Referenced,
}

/// A binary file that must accompany a KML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Archive-relative path, e.g. `images/icon-1.png`.
    pub path: String,
    pub contents: Vec<u8>,
}

/// A rendered KML document and the attachments it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmlDocument {
    /// UTF-8 encoded XML, including the prolog.
    pub contents: Vec<u8>,
    /// Files referenced by relative path; empty for [`IconMode::Embedded`].
    pub attachments: Vec<Attachment>,
}

/// Errors raised while building a KML document.
#[derive(Debug, Error)]
pub enum KmlError {
    /// An icon's PNG data URL did not hold valid base64.
    #[error("failed to decode PNG data URL of {icon} ({label:?})")]
    DecodeIcon {
        icon: IconId,
        label: String,
        #[source]
        source: base64::DecodeError,
    },
    /// Writing XML events failed.
    #[error("failed to write KML document")]
    Write(#[from] io::Error),
}

/// Identifier of the style map declared for `icon`.
///
/// # Examples
/// ```
/// use shelter_core::IconId;
/// use shelter_core::kml::style_map_id;
///
/// assert_eq!(style_map_id(IconId::new(0)), "icon-ci-1");
/// ```
#[must_use]
pub fn style_map_id(icon: IconId) -> String {
    format!("icon-ci-{}", icon.ordinal())
}

/// Archive path of the attachment extracted for `icon`.
#[must_use]
pub fn attachment_path(icon: IconId) -> String {
    format!("images/icon-{}.png", icon.ordinal())
}

/// Render the description pairs as an HTML fragment.
///
/// # Examples
/// ```
/// use shelter_core::kml::html_description;
///
/// let pairs = vec![("Type".into(), "Public".into())];
/// assert_eq!(html_description(&pairs), "<b>Type:</b> Public<br/>");
/// ```
#[must_use]
pub fn html_description(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("<b>{key}:</b> {value}<br/>"))
        .collect()
}

/// Build a KML document named `name` for the places of `view`.
///
/// # Errors
///
/// Returns [`KmlError::DecodeIcon`] when a referenced PNG data URL is not
/// valid base64, or [`KmlError::Write`] if the XML writer fails.
pub fn to_kml(view: MapView<'_>, name: &str, mode: IconMode) -> Result<KmlDocument, KmlError> {
    let mut xml = KmlWriter::new();
    let mut attachments = Vec::new();

    xml.declaration()?;
    xml.open("kml", &[("xmlns", KML_NAMESPACE)])?;
    xml.open("Document", &[])?;
    xml.text_element("name", name)?;

    for (index, icon) in view.icons().iter().enumerate() {
        let id = IconId::new(index);
        let href = resolve_href(id, icon, mode, &mut attachments)?;
        xml.icon_styles(id, &href)?;
    }

    for place in view.places() {
        xml.placemark(place)?;
    }

    xml.close("Document")?;
    xml.close("kml")?;

    Ok(KmlDocument {
        contents: xml.finish(),
        attachments,
    })
}

fn resolve_href(
    id: IconId,
    icon: &Icon,
    mode: IconMode,
    attachments: &mut Vec<Attachment>,
) -> Result<String, KmlError> {
    if mode == IconMode::Embedded {
        return Ok(icon.url.clone());
    }
    match data_url::decode_png(&icon.url) {
        Some(decoded) => {
            let contents = decoded.map_err(|source| KmlError::DecodeIcon {
                icon: id,
                label: icon.label.clone(),
                source,
            })?;
            let path = attachment_path(id);
            attachments.push(Attachment {
                path: path.clone(),
                contents,
            });
            Ok(path)
        }
        None => Ok(icon.url.clone()),
    }
}

/// Escape `&`, `<`, `>` and `"` in text content; apostrophes stay literal.
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = partial_escape(text);
    if escaped.contains('"') {
        Cow::Owned(escaped.replace('"', "&quot;"))
    } else {
        escaped
    }
}

/// Thin layer over `quick_xml::Writer` producing 2-space indented output.
struct KmlWriter {
    inner: Writer<Vec<u8>>,
}

impl KmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE),
        }
    }

    fn declaration(&mut self) -> io::Result<()> {
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attributes.iter().copied());
        self.inner.write_event(Event::Start(start))
    }

    fn close(&mut self, tag: &str) -> io::Result<()> {
        self.inner.write_event(Event::End(BytesEnd::new(tag)))
    }

    /// Write `<tag>text</tag>` on one line, or `<tag/>` when `text` is empty.
    fn text_element(&mut self, tag: &str, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return self.inner.write_event(Event::Empty(BytesStart::new(tag)));
        }
        self.open(tag, &[])?;
        self.inner
            .write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
        self.close(tag)
    }

    /// Write `payload` as literal character data inside `tag`.
    ///
    /// The section is emitted as pre-escaped text so the writer keeps it on
    /// the element's line; `]]>` inside the payload is split across two
    /// sections.
    fn cdata_element(&mut self, tag: &str, payload: &str) -> io::Result<()> {
        if payload.is_empty() {
            return self.inner.write_event(Event::Empty(BytesStart::new(tag)));
        }
        let section = format!("<![CDATA[{}]]>", payload.replace("]]>", "]]]]><![CDATA[>"));
        self.open(tag, &[])?;
        self.inner
            .write_event(Event::Text(BytesText::from_escaped(section)))?;
        self.close(tag)
    }

    fn icon_styles(&mut self, id: IconId, href: &str) -> io::Result<()> {
        let style_map = style_map_id(id);

        for substyle in SUBSTYLES {
            let style_id = format!("{style_map}-{substyle}");
            self.open("Style", &[("id", style_id.as_str())])?;
            self.open("IconStyle", &[])?;
            self.open("Icon", &[])?;
            self.text_element("href", href)?;
            self.close("Icon")?;
            self.close("IconStyle")?;
            self.close("Style")?;
        }

        self.open("StyleMap", &[("id", style_map.as_str())])?;
        for substyle in SUBSTYLES {
            self.open("Pair", &[])?;
            self.text_element("key", substyle)?;
            self.text_element("styleUrl", &format!("#{style_map}-{substyle}"))?;
            self.close("Pair")?;
        }
        self.close("StyleMap")
    }

    fn placemark(&mut self, place: &Place) -> io::Result<()> {
        self.open("Placemark", &[])?;
        self.text_element("name", &place.name)?;
        self.cdata_element("description", &html_description(&place.description))?;
        self.text_element("styleUrl", &format!("#{}", style_map_id(place.icon)))?;
        self.open("Point", &[])?;
        let coordinates = format!(
            "{},{},0",
            format_float(place.lon()),
            format_float(place.lat())
        );
        self.text_element("coordinates", &coordinates)?;
        self.close("Point")?;
        self.close("Placemark")
    }

    fn finish(self) -> Vec<u8> {
        let mut contents = self.inner.into_inner();
        contents.push(b'\n');
        contents
    }
}
