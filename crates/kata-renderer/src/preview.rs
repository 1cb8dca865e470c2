//! Problem previews.
//!
//! Two projections of a problem, neither of which mutates it:
//! - [`SummaryPreview`]: compact card with counts, an excerpt and media thumbnails
//! - the full page, rendering every section in order with the same templates
//!   the published problem page uses
//!
//! Author HTML always passes through [`harden_links`] first.

use std::fmt;

use kata_common::{
    Difficulty, EditorConfig, Example, MediaItem, ProblemMeta, Section, SectionBody,
};
use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_href, escape_html, escape_html_body_text};

use crate::html::text_content;
use crate::links::{SAFE_REL, SAFE_TARGET, harden_links};

const UNTITLED: &str = "Untitled problem";

/// Compact read view of a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPreview {
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    /// Plain text of the statements, truncated.
    pub statement_excerpt: String,
    pub example_count: usize,
    pub constraint_count: usize,
    pub hint_count: usize,
    /// First non-empty image URLs, in document order.
    pub image_urls: Vec<String>,
    /// First non-empty videos, in document order.
    pub videos: Vec<MediaItem>,
}

impl SummaryPreview {
    pub fn build(meta: &ProblemMeta, sections: &[Section], config: &EditorConfig) -> Self {
        let mut statement_text = String::new();
        let mut example_count = 0;
        let mut constraint_count = 0;
        let mut hint_count = 0;
        let mut images = Vec::new();
        let mut videos = Vec::new();

        for section in sections {
            match &section.body {
                SectionBody::Statement(statement) => {
                    let text = text_content(&statement.content_html);
                    if !text.is_empty() {
                        if !statement_text.is_empty() {
                            statement_text.push(' ');
                        }
                        statement_text.push_str(&text);
                    }
                }
                SectionBody::Images { items } => images.extend(
                    items
                        .iter()
                        .filter(|item| !item.url.trim().is_empty())
                        .map(|item| item.url.clone()),
                ),
                SectionBody::Videos { items } => videos.extend(
                    items
                        .iter()
                        .filter(|item| !item.url.trim().is_empty())
                        .cloned(),
                ),
                SectionBody::Examples { items } => example_count += items.len(),
                SectionBody::Constraints { items } => constraint_count += items.len(),
                SectionBody::Hints { items } => hint_count += items.len(),
            }
        }

        images.truncate(config.summary_images);
        videos.truncate(config.summary_videos);

        Self {
            title: meta.title.clone(),
            difficulty: meta.difficulty,
            tags: meta.tags.iter().map(str::to_string).collect(),
            statement_excerpt: truncate_chars(&statement_text, config.excerpt_chars),
            example_count,
            constraint_count,
            hint_count,
            image_urls: images,
            videos,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_summary_fmt(&mut out, self);
        out
    }
}

/// Truncate to `max` chars, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut out = text[..cut].trim_end().to_string();
            out.push('…');
            out
        }
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

struct PreviewWriter<W> {
    writer: W,
}

impl<W: StrWrite> PreviewWriter<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    #[inline]
    fn text(&mut self, s: &str) -> Result<(), W::Error> {
        escape_html_body_text(&mut self.writer, s)
    }

    #[inline]
    fn attr(&mut self, s: &str) -> Result<(), W::Error> {
        escape_html(&mut self.writer, s)
    }

    fn external_link(&mut self, url: &str, label: &str) -> Result<(), W::Error> {
        self.write("<a href=\"")?;
        escape_href(&mut self.writer, url)?;
        self.write("\" target=\"")?;
        self.write(SAFE_TARGET)?;
        self.write("\" rel=\"")?;
        self.write(SAFE_REL)?;
        self.write("\">")?;
        self.text(label)?;
        self.write("</a>")
    }

    fn meta_line(&mut self, difficulty: Difficulty, tags: &[&str]) -> Result<(), W::Error> {
        self.write("<p class=\"problem-meta\"><span class=\"difficulty difficulty-")?;
        self.write(&difficulty.as_str().to_lowercase())?;
        self.write("\">")?;
        self.write(difficulty.as_str())?;
        self.write("</span>")?;
        for tag in tags {
            self.write("<span class=\"tag\">")?;
            self.text(tag)?;
            self.write("</span>")?;
        }
        self.write("</p>\n")
    }

    fn title(&mut self, title: &str) -> Result<(), W::Error> {
        self.write("<h1 class=\"problem-title\">")?;
        let title = title.trim();
        self.text(if title.is_empty() { UNTITLED } else { title })?;
        self.write("</h1>\n")
    }

    fn summary(&mut self, summary: &SummaryPreview) -> Result<(), W::Error> {
        self.write("<section class=\"problem-summary\">\n")?;
        self.title(&summary.title)?;
        let tags: Vec<&str> = summary.tags.iter().map(String::as_str).collect();
        self.meta_line(summary.difficulty, &tags)?;

        self.write("<p class=\"statement-excerpt\">")?;
        self.text(&summary.statement_excerpt)?;
        self.write("</p>\n")?;

        self.write("<ul class=\"section-counts\"><li>")?;
        self.text(&plural(summary.example_count, "example", "examples"))?;
        self.write("</li><li>")?;
        self.text(&plural(
            summary.constraint_count,
            "constraint",
            "constraints",
        ))?;
        self.write("</li><li>")?;
        self.text(&plural(summary.hint_count, "hint", "hints"))?;
        self.write("</li></ul>\n")?;

        if !summary.image_urls.is_empty() {
            self.write("<div class=\"image-grid\">")?;
            for url in &summary.image_urls {
                self.write("<img src=\"")?;
                escape_href(&mut self.writer, url)?;
                self.write("\" alt=\"\" loading=\"lazy\" />")?;
            }
            self.write("</div>\n")?;
        }

        if !summary.videos.is_empty() {
            self.write("<ul class=\"video-links\">")?;
            for video in &summary.videos {
                self.write("<li>")?;
                self.external_link(&video.url, media_label(video))?;
                self.write("</li>")?;
            }
            self.write("</ul>\n")?;
        }

        self.write("</section>\n")
    }

    fn problem(&mut self, meta: &ProblemMeta, sections: &[Section]) -> Result<(), W::Error> {
        self.write("<article class=\"problem\">\n<header>\n")?;
        self.title(&meta.title)?;
        let tags: Vec<&str> = meta.tags.iter().collect();
        self.meta_line(meta.difficulty, &tags)?;
        self.write("</header>\n")?;
        for section in sections {
            self.section(section)?;
        }
        self.write("</article>\n")
    }

    fn section_open(&mut self, class: &str, section: &Section) -> Result<(), W::Error> {
        self.write("<section class=\"")?;
        self.write(class)?;
        self.write("\" id=\"")?;
        self.attr(section.id.as_str())?;
        self.write("\">\n")
    }

    fn section(&mut self, section: &Section) -> Result<(), W::Error> {
        match &section.body {
            SectionBody::Statement(statement) => {
                self.section_open("problem-statement", section)?;
                self.write(&harden_links(&statement.content_html))?;
                self.write("\n")?;
            }
            SectionBody::Images { items } => {
                self.section_open("problem-images", section)?;
                for item in items.iter().filter(|item| !item.url.trim().is_empty()) {
                    self.figure(item)?;
                }
            }
            SectionBody::Videos { items } => {
                self.section_open("problem-videos", section)?;
                self.write("<ul>")?;
                for item in items.iter().filter(|item| !item.url.trim().is_empty()) {
                    self.write("<li>")?;
                    self.external_link(&item.url, media_label(item))?;
                    self.write("</li>")?;
                }
                self.write("</ul>\n")?;
            }
            SectionBody::Examples { items } => {
                self.section_open("problem-examples", section)?;
                for (index, example) in items.iter().enumerate() {
                    self.example(index + 1, example)?;
                }
            }
            SectionBody::Constraints { items } => {
                self.section_open("problem-constraints", section)?;
                self.write("<h3>Constraints</h3>\n<ul>")?;
                for constraint in items {
                    self.write("<li><code>")?;
                    self.text(constraint)?;
                    self.write("</code></li>")?;
                }
                self.write("</ul>\n")?;
            }
            SectionBody::Hints { items } => {
                self.section_open("problem-hints", section)?;
                for (index, hint) in items.iter().enumerate() {
                    write!(
                        &mut self.writer,
                        "<details><summary>Hint {}</summary><p>",
                        index + 1
                    )?;
                    self.text(hint)?;
                    self.write("</p></details>\n")?;
                }
            }
        }
        self.write("</section>\n")
    }

    fn figure(&mut self, item: &MediaItem) -> Result<(), W::Error> {
        self.write("<figure><img src=\"")?;
        escape_href(&mut self.writer, &item.url)?;
        self.write("\" alt=\"")?;
        self.attr(&item.caption)?;
        self.write("\" />")?;
        if !item.caption.trim().is_empty() {
            self.write("<figcaption>")?;
            self.text(&item.caption)?;
            self.write("</figcaption>")?;
        }
        self.write("</figure>\n")
    }

    fn example(&mut self, number: usize, example: &Example) -> Result<(), W::Error> {
        write!(
            &mut self.writer,
            "<div class=\"example\"><h3>Example {}</h3><pre>",
            number
        )?;
        self.write("<strong>Input:</strong> ")?;
        self.text(&example.input)?;
        self.write("\n<strong>Output:</strong> ")?;
        self.text(&example.output)?;
        if !example.explanation.trim().is_empty() {
            self.write("\n<strong>Explanation:</strong> ")?;
            self.text(&example.explanation)?;
        }
        self.write("</pre></div>\n")
    }
}

fn media_label(item: &MediaItem) -> &str {
    let caption = item.caption.trim();
    if caption.is_empty() { &item.url } else { caption }
}

/// Write the summary card into a Unicode-accepting buffer or stream.
pub fn write_summary_fmt<W: fmt::Write>(writer: W, summary: &SummaryPreview) -> fmt::Result {
    PreviewWriter::new(FmtWriter(writer)).summary(summary)
}

/// Write the full problem page into a Unicode-accepting buffer or stream.
pub fn write_problem_fmt<W: fmt::Write>(
    writer: W,
    meta: &ProblemMeta,
    sections: &[Section],
) -> fmt::Result {
    PreviewWriter::new(FmtWriter(writer)).problem(meta, sections)
}

/// Render the full problem page to a String.
pub fn render_problem_html(meta: &ProblemMeta, sections: &[Section]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_problem_fmt(&mut out, meta, sections);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kata_common::{SectionId, SectionKind, TagSet};

    fn meta() -> ProblemMeta {
        ProblemMeta {
            title: "Two Sum".to_string(),
            difficulty: Difficulty::Medium,
            tags: ["Array", "hash-map"].into_iter().collect::<TagSet>(),
        }
    }

    fn section(index: u64, body: SectionBody) -> Section {
        Section::new(SectionId::from_index(index), body)
    }

    fn media(urls: &[&str]) -> Vec<MediaItem> {
        urls.iter()
            .map(|url| MediaItem {
                url: url.to_string(),
                caption: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly", 7), "exactly");
        assert_eq!(truncate_chars("hello world", 6), "hello…");
        assert_eq!(truncate_chars("héllo", 2), "hé…");
    }

    #[test]
    fn test_summary_counts_and_limits() {
        let sections = vec![
            section(0, SectionBody::statement("<p>Given <b>nums</b>, find a pair.</p>")),
            section(
                1,
                SectionBody::Images {
                    items: media(&["1.png", "", "2.png", "3.png", "4.png", "5.png", "6.png", "7.png"]),
                },
            ),
            section(
                2,
                SectionBody::Videos {
                    items: media(&["a.mp4", "b.mp4", "c.mp4", "d.mp4"]),
                },
            ),
            section(
                3,
                SectionBody::Examples {
                    items: vec![Example::default(), Example::default()],
                },
            ),
            section(4, SectionBody::new(SectionKind::Constraints, "")),
            section(
                5,
                SectionBody::Hints {
                    items: vec!["a".into(), "b".into(), "c".into()],
                },
            ),
        ];
        let summary = SummaryPreview::build(&meta(), &sections, &EditorConfig::default());

        assert_eq!(summary.statement_excerpt, "Given nums, find a pair.");
        assert_eq!(summary.example_count, 2);
        assert_eq!(summary.constraint_count, 1);
        assert_eq!(summary.hint_count, 3);
        assert_eq!(
            summary.image_urls,
            vec!["1.png", "2.png", "3.png", "4.png", "5.png", "6.png"]
        );
        assert_eq!(summary.videos.len(), 3);
        assert_eq!(summary.tags, vec!["array", "hash-map"]);
    }

    #[test]
    fn test_summary_html() {
        let sections = vec![section(
            0,
            SectionBody::statement("<p>Sum &amp; <i>return</i> it.</p>"),
        )];
        let summary = SummaryPreview::build(&meta(), &sections, &EditorConfig::default());
        insta::assert_snapshot!(summary.to_html().trim_end(), @r#"
        <section class="problem-summary">
        <h1 class="problem-title">Two Sum</h1>
        <p class="problem-meta"><span class="difficulty difficulty-medium">Medium</span><span class="tag">array</span><span class="tag">hash-map</span></p>
        <p class="statement-excerpt">Sum &amp; return it.</p>
        <ul class="section-counts"><li>0 examples</li><li>0 constraints</li><li>0 hints</li></ul>
        </section>
        "#);
    }

    #[test]
    fn test_full_preview_hardens_statement_links() {
        let sections = vec![section(
            0,
            SectionBody::statement(r#"<p>Read <a href="https://oeis.org">this</a>.</p>"#),
        )];
        let html = render_problem_html(&meta(), &sections);
        assert!(html.contains(
            r#"<a href="https://oeis.org" target="_blank" rel="noopener noreferrer">this</a>"#
        ));
    }

    #[test]
    fn test_full_preview_section_order_and_escaping() {
        let sections = vec![
            section(0, SectionBody::statement("<p>S</p>")),
            section(
                1,
                SectionBody::Examples {
                    items: vec![Example {
                        input: "a < b".to_string(),
                        output: "true".to_string(),
                        explanation: String::new(),
                    }],
                },
            ),
            section(
                2,
                SectionBody::Constraints {
                    items: vec!["1 <= n".to_string()],
                },
            ),
            section(
                3,
                SectionBody::Hints {
                    items: vec!["Use a <map>".to_string()],
                },
            ),
        ];
        let html = render_problem_html(&meta(), &sections);

        let statement = html.find("problem-statement").unwrap();
        let examples = html.find("problem-examples").unwrap();
        let constraints = html.find("problem-constraints").unwrap();
        let hints = html.find("problem-hints").unwrap();
        assert!(statement < examples && examples < constraints && constraints < hints);

        assert!(html.contains("<strong>Input:</strong> a &lt; b"));
        assert!(!html.contains("Explanation"));
        assert!(html.contains("<li><code>1 &lt;= n</code></li>"));
        assert!(html.contains("<summary>Hint 1</summary><p>Use a &lt;map&gt;</p>"));
    }

    #[test]
    fn test_untitled_problem() {
        let sections = vec![section(0, SectionBody::statement(""))];
        let html = render_problem_html(&ProblemMeta::default(), &sections);
        assert!(html.contains("<h1 class=\"problem-title\">Untitled problem</h1>"));
    }
}
