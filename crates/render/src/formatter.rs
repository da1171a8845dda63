//! Record-to-HTML formatting.
//!
//! A [`Formatter`] compiles the embedded templates once, up front, so that
//! template syntax errors surface at construction time rather than in the
//! middle of a regeneration. The same instance is reused for every fragment
//! of every category.
//!
//! Three templates cooperate:
//!
//! - **`item.html`** — one record (linked title, host caption, byline,
//!   optional thumbnail and description).
//! - **`page.html`** — one listing page: rendered items plus a "next page"
//!   link when more pages follow.
//! - **`home.html`** — the front-page preview: rendered items, no pager.
//!
//! Record fields are visitor-submitted and untrusted; every interpolation of
//! them goes through the `escape` formatter. The `host` formatter renders a
//! URL's host part as a caption, the way the original listings credited
//! submissions.

use crate::assets::Templates;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::format_description::{self, OwnedFormatItem};
use tracing::instrument;
use upon::{Engine, Template};
use vitrine_records::Record;

/// Pagination context for rendering one listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    /// 1-indexed number of the page being rendered.
    pub page: u64,
    /// Number of the following page, if one exists.
    pub next: Option<u64>,
}

/// Renders records into the HTML fragments the page cache publishes.
pub struct Formatter {
    engine: Engine<'static>,
    home: Template<'static>,
    page: Template<'static>,
    item: Template<'static>,
    date_format: OwnedFormatItem,
}

impl Formatter {
    /// Compile all embedded templates into a reusable formatter.
    ///
    /// Returns [`ErrorKind::Template`] if any template fails to compile, or
    /// [`ErrorKind::AssetNotFound`] if one is missing from the embed.
    pub fn new() -> Result<Self> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let home = engine.compile(Templates::load("home.html")?).or_raise(|| ErrorKind::Template)?;
        let page = engine.compile(Templates::load("page.html")?).or_raise(|| ErrorKind::Template)?;
        let item = engine.compile(Templates::load("item.html")?).or_raise(|| ErrorKind::Template)?;
        // "[day] [month] [year]" renders as e.g. `8 Jan 2026`.
        let date_format = format_description::parse_owned::<2>("[day padding:none] [month repr:short] [year]")
            .or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, home, page, item, date_format })
    }

    /// Render the front-page preview fragment from the newest records.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn home(&self, records: &[Record]) -> Result<String> {
        let items = self.items(records)?;
        self.home.render(&self.engine, upon::value! { items: items }).to_string().or_raise(|| ErrorKind::Render)
    }

    /// Render one listing page fragment.
    ///
    /// Appends a "next page" link when [`PageContext::next`] is set.
    #[instrument(skip_all, fields(page = ctx.page, records = records.len()))]
    pub fn page(&self, records: &[Record], ctx: PageContext) -> Result<String> {
        let items = self.items(records)?;
        self.page
            .render(&self.engine, upon::value! {
                items: items,
                has_next: ctx.next.is_some(),
                next: ctx.next.unwrap_or_default(),
            })
            .to_string()
            .or_raise(|| ErrorKind::Render)
    }

    fn items(&self, records: &[Record]) -> Result<Vec<String>> {
        records.iter().map(|record| self.item(record)).collect()
    }

    fn item(&self, record: &Record) -> Result<String> {
        let date = record.submitted_at.format(&self.date_format).or_raise(|| ErrorKind::Render)?;
        self.item
            .render(&self.engine, upon::value! {
                title: &record.title,
                author: &record.author,
                url: &record.url,
                date: date,
                has_image: record.image_url.is_some(),
                image_url: record.image_url.clone().unwrap_or_default(),
                has_description: record.description.is_some(),
                description: record.description.clone().unwrap_or_default(),
            })
            .to_string()
            .or_raise(|| ErrorKind::Render)
    }
}

/// Custom [`upon`] extensions for fragment markup.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// HTML entity escaping for visitor-submitted strings.
    ///
    /// `upon`'s default formatter writes values through verbatim, which is
    /// what the nested pre-rendered item fragments rely on — so escaping is
    /// opt-in at each interpolation of an untrusted field.
    fn escape_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for c in s.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Displays the host part of a submitted URL (`http://a.b/c` → `a.b`).
    fn host_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                let rest = s.split_once("://").map_or(s.as_str(), |(_, rest)| rest);
                let host = rest.split('/').next().unwrap_or(rest);
                // The host came out of a visitor-submitted URL; escape it too.
                for c in host.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Registers the `escape` and `host` formatters on the given engine.
    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("escape", escape_formatter);
        engine.add_formatter("host", host_formatter);
    }
}
