// src/crawler/datascraper.rs

//! Page-level extraction. Every function here takes the raw HTML of one page
//! and returns owned data, so no parsed document outlives the call.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

use crate::config::HiddenFieldRule;
use crate::domain::Poem;
use crate::error::{PoetryError, Result};

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

/// The markers this site uses, compiled once.
struct Selectors {
    title: Selector,
    copyright: Selector,
    poem_body: Selector,
    bio: Selector,
    user_link: Selector,
    views: Selector,
    author_copyright: Selector,
    timeago: Selector,
    categories: Selector,
    anchor: Selector,
    like_wrap: Selector,
    num: Selector,
    comments: Selector,
    media: Selector,
    media_body: Selector,
    links_container: Selector,
    clearfix: Selector,
    link_item: Selector,
    hidden_input: Selector,
    error: Selector,
    media_figure: Selector,
}

impl Selectors {
    fn get() -> &'static Selectors {
        SELECTORS.get_or_init(|| {
            let parse = |css: &str| Selector::parse(css).unwrap();
            Selectors {
                title: parse(".title"),
                copyright: parse("div.copyright"),
                poem_body: parse(".poem_body"),
                bio: parse(".bio"),
                user_link: parse(".u"),
                views: parse("span#views"),
                author_copyright: parse(".author_copyright"),
                timeago: parse(".timeago"),
                categories: parse(".cats_dot"),
                anchor: parse("a"),
                like_wrap: parse(".cmt_wrap"),
                num: parse(".num"),
                comments: parse(".comments"),
                media: parse(".media"),
                media_body: parse(".media-body"),
                links_container: parse(".t_links"),
                clearfix: parse(".clearfix"),
                link_item: parse("div.itm"),
                hidden_input: parse(r#"form input[type="hidden"]"#),
                error: parse(".error"),
                media_figure: parse(".media-figure"),
            }
        })
    }
}

/// One entry of a comment page, before threading.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentEntry {
    /// 0 for a comment on the poem itself.
    pub depth: usize,
    pub user: String,
    pub date: DateTime<FixedOffset>,
    pub text: String,
}

/// Parse a poem page. Comments are left unset; they live on separate pages.
pub fn parse_poem_page(html: &str, url: &str, include_author: bool) -> Result<Poem> {
    let document = Html::parse_document(html);
    let sel = Selectors::get();

    let title = first(document.root_element(), &sel.title)
        .map(|e| text_of(e).trim().to_string())
        .ok_or(PoetryError::MissingElement("title"))?;

    let meta = first(document.root_element(), &sel.copyright)
        .map(text_of)
        .ok_or(PoetryError::MissingElement("copyright"))?;

    let body_text = first(document.root_element(), &sel.poem_body)
        .map(text_of)
        .ok_or(PoetryError::MissingElement("poem body"))?;
    let body = split_body(&body_text, &meta);

    let author = if include_author {
        first(document.root_element(), &sel.bio)
            .and_then(|bio| first(bio, &sel.user_link))
            .and_then(|link| link.value().attr("href"))
            .map(|href| href.strip_prefix('/').unwrap_or(href).to_string())
    } else {
        None
    };

    let count_views = first(document.root_element(), &sel.views).and_then(|span| {
        let text = text_of(span);
        let before = text.split("views").next().unwrap_or_default();
        parse_view_count(before)
    });

    let date = first(document.root_element(), &sel.author_copyright)
        .and_then(|block| first(block, &sel.timeago))
        .and_then(|timeago| timeago.value().attr("title"))
        .map(parse_timestamp)
        .transpose()?;

    let categories = first(document.root_element(), &sel.categories).map(|block| {
        block
            .select(&sel.anchor)
            .map(|a| text_of(a).trim().to_string())
            .collect::<Vec<_>>()
    });

    let count_likes = first(document.root_element(), &sel.like_wrap)
        .and_then(|wrap| first(wrap, &sel.num))
        .map(|num| parse_count("likes", &text_of(num)))
        .transpose()?;

    Ok(Poem {
        title,
        author,
        body,
        meta,
        url: url.to_string(),
        date,
        count_likes,
        count_views,
        categories,
        comments: None,
    })
}

/// Turn "321" or "541.7k" into a count. Anything else yields `None`.
pub fn parse_view_count(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(count) = text.parse::<i64>() {
        return Some(count);
    }
    if !text.contains('k') {
        return None;
    }
    let thousands = text.replace('k', "").trim().parse::<f64>().ok()?;
    if !thousands.is_finite() {
        return None;
    }
    Some((thousands * 1000.0).trunc() as i64)
}

/// The flat, depth-annotated comment list of one comment page.
///
/// A page without a comments block has no entries.
pub fn parse_comment_entries(html: &str) -> Result<Vec<CommentEntry>> {
    let document = Html::parse_document(html);
    let sel = Selectors::get();

    let Some(container) = first(document.root_element(), &sel.comments) else {
        return Ok(Vec::new());
    };

    container
        .select(&sel.media)
        .map(|media| parse_comment_entry(media, sel))
        .collect()
}

fn parse_comment_entry(media: ElementRef<'_>, sel: &Selectors) -> Result<CommentEntry> {
    let raw_depth = media
        .value()
        .attr("data-depth")
        .ok_or(PoetryError::MissingElement("comment depth"))?;
    let depth = raw_depth
        .trim()
        .parse::<usize>()
        .map_err(|_| PoetryError::InvalidNumber {
            field: "comment depth",
            value: raw_depth.to_string(),
        })?;

    let user = first(media, &sel.user_link)
        .map(text_of)
        .ok_or(PoetryError::MissingElement("comment user"))?;

    let date = first(media, &sel.timeago)
        .and_then(|timeago| timeago.value().attr("title"))
        .ok_or(PoetryError::MissingElement("comment date"))
        .and_then(parse_timestamp)?;

    let body = first(media, &sel.media_body).ok_or(PoetryError::MissingElement("comment body"))?;
    let relative_time = first(body, &sel.timeago).map(text_of);
    let text = comment_text(&text_of(body), &user, relative_time.as_deref());

    Ok(CommentEntry {
        depth,
        user,
        date,
        text,
    })
}

/// The body text is interleaved with the username and the rendered
/// relative time; cut both out.
fn comment_text(raw: &str, user: &str, relative_time: Option<&str>) -> String {
    let without_user = raw.replace(user, "");
    // separator rendered after the username
    let rest: String = without_user.chars().skip(3).collect();
    let cut = relative_time
        .filter(|time| !time.is_empty())
        .and_then(|time| rest.find(time));
    let text = match cut {
        Some(end) => &rest[..end],
        None => rest.as_str(),
    };
    text.trim().to_string()
}

/// `(title, location)` pairs from one page of a user's poem index.
pub fn parse_link_rows(html: &str, page_url: &Url) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let sel = Selectors::get();

    let Some(rows) = first(document.root_element(), &sel.links_container)
        .and_then(|container| first(container, &sel.clearfix))
    else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();
    for item in rows.select(&sel.link_item) {
        let anchor = first(item, &sel.anchor).ok_or(PoetryError::MissingElement("poem link"))?;
        let href = anchor
            .value()
            .attr("href")
            .ok_or(PoetryError::MissingElement("poem link href"))?;
        let title = text_of(anchor).trim().to_string();
        links.push((title, page_url.join(href)?.to_string()));
    }
    Ok(links)
}

/// Hidden `<input>`s of the page's forms that `rule` selects, as `(name, value)`.
pub fn select_hidden_inputs(html: &str, rule: &HiddenFieldRule) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let sel = Selectors::get();

    let inputs: Vec<ElementRef<'_>> = document.select(&sel.hidden_input).collect();

    match rule {
        // strictly positional: a nameless input still takes its slot
        HiddenFieldRule::FirstN(n) => {
            if inputs.len() < *n {
                return Err(PoetryError::MissingElement("login form hidden inputs"));
            }
            inputs.into_iter().take(*n).map(hidden_field).collect()
        }
        HiddenFieldRule::Named(names) => names
            .iter()
            .map(|name| {
                inputs
                    .iter()
                    .find(|input| input.value().attr("name") == Some(name.as_str()))
                    .copied()
                    .ok_or(PoetryError::MissingElement("login form hidden input"))
                    .and_then(hidden_field)
            })
            .collect(),
    }
}

fn hidden_field(input: ElementRef<'_>) -> Result<(String, String)> {
    let name = input
        .value()
        .attr("name")
        .ok_or(PoetryError::MissingElement("login form hidden input name"))?;
    let value = input.value().attr("value").unwrap_or_default();
    Ok((name.to_string(), value.to_string()))
}

/// Text of every `.error` element, in document order.
pub fn extract_error_messages(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document.select(&Selectors::get().error).map(text_of).collect()
}

/// Absolute location of the profile picture on a user page.
pub fn extract_picture_url(html: &str, page_url: &Url) -> Result<Url> {
    let document = Html::parse_document(html);
    let src = first(document.root_element(), &Selectors::get().media_figure)
        .and_then(|figure| figure.value().attr("src"))
        .ok_or(PoetryError::MissingElement("profile picture"))?;
    Ok(page_url.join(src)?)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date);
    }
    if let Ok(date) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(date);
    }
    let naive = raw.strip_suffix(" UTC").unwrap_or(raw);
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|date| date.and_utc().fixed_offset())
        .ok_or_else(|| PoetryError::InvalidDate(raw.to_string()))
}

fn parse_count(field: &'static str, text: &str) -> Result<u64> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| PoetryError::InvalidNumber {
            field,
            value: text.to_string(),
        })
}

/// Everything before the meta block, one entry per line.
fn split_body(body_text: &str, meta: &str) -> Vec<String> {
    let poem = if meta.is_empty() {
        body_text
    } else {
        body_text.split(meta).next().unwrap_or_default()
    };
    poem.split('\n').map(String::from).collect()
}

fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
