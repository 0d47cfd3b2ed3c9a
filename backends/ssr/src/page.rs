//! The document shell around a server-rendered page.
//!
//! A [`PageStream`] yields the document head before the page component renders, then the
//! body fragments as the [`RenderStream`] produces them, then the closing markup. A render
//! failure is logged and replaced by an inline error fragment so the document always closes.

use alloc::{
    boxed::Box,
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, iter::FusedIterator};
use std::io;

use brook_core::{Config, PageMeta, Render, RenderError, Scope, VNode, escape_html};
use brook_reactive::{Map, State, Value, json};
use futures::Stream;

use crate::{script::script_json, stream::RenderStream};

/// Body written in place of a page whose render failed.
pub const RENDER_FAILURE_FRAGMENT: &str = "<h1>Internal Server Error</h1>";

/// Options of the document shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    lang: String,
    entry: Option<String>,
    head: Vec<String>,
    config: Option<Config>,
    root_id: String,
    chunk_size: usize,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            lang: "en".into(),
            entry: Some(Self::DEFAULT_ENTRY.into()),
            head: Vec::new(),
            config: None,
            root_id: "app".into(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Shell {
    /// Module script loaded by the client when no other entry is set.
    pub const DEFAULT_ENTRY: &'static str = "/src/app.js";
    /// Minimum size of a body chunk when chunked rendering is on.
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    /// Creates the default shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `lang` attribute of the document.
    #[must_use]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Sets the client entry module, or removes it with `None`.
    #[must_use]
    pub fn entry(mut self, entry: Option<impl Into<String>>) -> Self {
        self.entry = entry.map(Into::into);
        self
    }

    /// Appends raw markup to the head. The markup is trusted and written unescaped.
    #[must_use]
    pub fn head_tag(mut self, markup: impl Into<String>) -> Self {
        self.head.push(markup.into());
        self
    }

    /// Embeds `config` as `window.__BROOK_CONFIG__` and applies its rendering flags.
    #[must_use]
    pub const fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the id of the element the page body is rendered into.
    #[must_use]
    pub fn root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = id.into();
        self
    }

    /// Sets the minimum chunk size used when chunked rendering is on.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Starts streaming `view` as a full document.
    pub fn render_stream<V: Render>(
        &self,
        view: V,
        props: Map<String, Value>,
        url: &str,
        injections: &Map<String, Value>,
    ) -> PageStream {
        let head = self.head_markup(&view.meta(), url, injections);
        let config = self.config.unwrap_or_default();
        let chunk = config.chunk_render.then_some(self.chunk_size.max(1));
        let render = Box::new(move || {
            let state = State::from_map(view.initial_state(&props));
            view.render(&Scope::new(&props, &state, &config, None))
        });
        PageStream {
            head: Some(head),
            body: Body::Pending(render),
            footer: Some(self.footer_markup()),
            chunk,
        }
    }

    fn head_markup(
        &self,
        meta: &PageMeta,
        url: &str,
        injections: &Map<String, Value>,
    ) -> String {
        let title = escape_html(meta.title_or_default());
        let description = escape_html(meta.description_or_default());
        let image = escape_html(meta.image_or_default());
        let url = escape_html(url);

        let mut out = String::with_capacity(2048);
        out.push_str("<!DOCTYPE html>\n<html lang=\"");
        out.push_str(&escape_html(&self.lang));
        out.push_str("\">\n<head>\n");
        out.push_str("<meta charset=\"UTF-8\">\n");
        out.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        out.push_str(&format!("<title>{title}</title>\n"));

        for (key, value) in injections {
            let name = global_name(key);
            if name.is_empty() {
                tracing::warn!(
                    target: "brook::ssr",
                    key = %key,
                    "skipping injection without a usable name"
                );
                continue;
            }
            match script_json(value) {
                Ok(json) => out.push_str(&format!(
                    "<script>window.__{name}__ = {json};</script>\n"
                )),
                Err(error) => {
                    tracing::error!(
                        target: "brook::ssr",
                        key = %key,
                        %error,
                        "failed to serialize injection"
                    );
                }
            }
        }
        if let Some(config) = &self.config {
            match script_json(config) {
                Ok(json) => out.push_str(&format!(
                    "<script>window.__BROOK_CONFIG__ = {json};</script>\n"
                )),
                Err(error) => {
                    tracing::error!(target: "brook::ssr", %error, "failed to serialize config");
                }
            }
        }

        meta_tag(&mut out, "name", "description", &description);
        meta_tag(&mut out, "property", "og:type", "website");
        meta_tag(&mut out, "property", "og:url", &url);
        meta_tag(&mut out, "property", "og:title", &title);
        meta_tag(&mut out, "property", "og:description", &description);
        meta_tag(&mut out, "property", "og:image", &image);
        meta_tag(&mut out, "name", "twitter:card", "summary_large_image");
        meta_tag(&mut out, "name", "twitter:title", &title);
        meta_tag(&mut out, "name", "twitter:description", &description);
        meta_tag(&mut out, "name", "twitter:image", &image);

        if let Some(entry) = &self.entry {
            out.push_str(&format!(
                "<link rel=\"modulepreload\" href=\"{}\">\n",
                escape_html(entry)
            ));
        }
        for tag in &self.head {
            out.push_str(tag);
            out.push('\n');
        }

        let ld = json!({
            "@context": "https://schema.org",
            "@type": "WebPage",
            "name": meta.title_or_default(),
            "description": meta.description_or_default(),
        });
        if let Ok(ld) = script_json(&ld) {
            out.push_str(&format!(
                "<script type=\"application/ld+json\">{ld}</script>\n"
            ));
        }

        out.push_str("</head>\n<body>\n<div id=\"");
        out.push_str(&escape_html(&self.root_id));
        out.push_str("\">");
        out
    }

    fn footer_markup(&self) -> String {
        let mut out = String::from("</div>\n");
        if let Some(entry) = &self.entry {
            out.push_str(&format!(
                "<script type=\"module\" src=\"{}\"></script>\n",
                escape_html(entry)
            ));
        }
        out.push_str("</body>\n</html>");
        out
    }
}

fn meta_tag(out: &mut String, attr: &str, name: &str, content: &str) {
    out.push_str(&format!("<meta {attr}=\"{name}\" content=\"{content}\">\n"));
}

/// `routes` becomes `ROUTES`; characters that cannot appear in an identifier are dropped.
fn global_name(key: &str) -> String {
    key.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .map(|ch| ch.to_ascii_uppercase())
        .collect()
}

type RenderFn = Box<dyn FnOnce() -> Result<VNode, RenderError>>;

enum Body {
    Pending(RenderFn),
    Streaming(RenderStream),
    Done,
}

/// A full document as a pull-driven sequence of markup fragments.
pub struct PageStream {
    head: Option<String>,
    body: Body,
    footer: Option<String>,
    chunk: Option<usize>,
}

impl fmt::Debug for PageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = if self.head.is_some() {
            "head"
        } else {
            match self.body {
                Body::Pending(_) => "pending",
                Body::Streaming(_) => "streaming",
                Body::Done if self.footer.is_some() => "footer",
                Body::Done => "done",
            }
        };
        f.debug_struct("PageStream")
            .field("phase", &phase)
            .field("chunk", &self.chunk)
            .finish()
    }
}

impl PageStream {
    /// Adapts the page into an asynchronous stream of fragments.
    pub fn into_stream(self) -> impl Stream<Item = String> {
        futures::stream::iter(self)
    }

    /// Pulls every fragment and writes it to `writer` as soon as it is produced.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `writer`; nothing further is rendered after it.
    pub fn write_to<W: io::Write>(self, writer: &mut W) -> io::Result<usize> {
        let mut written = 0;
        for fragment in self {
            writer.write_all(fragment.as_bytes())?;
            written += fragment.len();
        }
        writer.flush()?;
        Ok(written)
    }

    fn next_body(&mut self) -> Option<String> {
        loop {
            match &mut self.body {
                Body::Done => return None,
                Body::Pending(_) => {
                    let Body::Pending(render) = core::mem::replace(&mut self.body, Body::Done)
                    else {
                        return None;
                    };
                    match render() {
                        Ok(node) => self.body = Body::Streaming(RenderStream::new(node)),
                        Err(error) => {
                            tracing::error!(target: "brook::ssr", %error, "page render failed");
                            return Some(RENDER_FAILURE_FRAGMENT.to_string());
                        }
                    }
                }
                Body::Streaming(stream) => {
                    let fragment = match self.chunk {
                        None => stream.next(),
                        Some(size) => {
                            let mut chunk = String::new();
                            while chunk.len() < size {
                                let Some(fragment) = stream.next() else {
                                    break;
                                };
                                chunk.push_str(&fragment);
                            }
                            (!chunk.is_empty()).then_some(chunk)
                        }
                    };
                    if fragment.is_none() {
                        self.body = Body::Done;
                    }
                    return fragment;
                }
            }
        }
    }
}

impl Iterator for PageStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if let Some(head) = self.head.take() {
            return Some(head);
        }
        if let Some(fragment) = self.next_body() {
            return Some(fragment);
        }
        self.footer.take()
    }
}

impl FusedIterator for PageStream {}

/// Streams `view` inside the default document shell.
///
/// `injections` are embedded in the head as `window.__KEY__` globals (the key upper-cased),
/// serialized as script-safe JSON.
pub fn render_page_stream<V: Render>(
    view: V,
    props: Map<String, Value>,
    url: &str,
    injections: &Map<String, Value>,
) -> PageStream {
    Shell::default().render_stream(view, props, url, injections)
}

/// Renders `view` inside `shell` and returns the whole document.
pub fn render_page<V: Render>(
    view: V,
    props: Map<String, Value>,
    url: &str,
    shell: &Shell,
) -> String {
    shell
        .render_stream(view, props, url, &Map::new())
        .collect()
}
