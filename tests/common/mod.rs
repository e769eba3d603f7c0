// ABOUTME: Shared fixtures for the slide-audit integration tests
// ABOUTME: Builds self-contained decks with a minimal reveal-style navigation runtime

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_slide-audit"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Slide markup for a short, well-behaved slide
pub fn plain_slide(title: &str) -> String {
    format!("<h1>{}</h1><p>Nothing to see here.</p>", title)
}

/// Slide whose content is `height` pixels tall
pub fn tall_slide(title: &str, height: u32) -> String {
    format!(
        r#"<div style="height: {}px; background: #eee;">{}</div>"#,
        height, title
    )
}

/// Slide with short content followed by a fragment that pushes past the canvas
pub fn fragment_slide(title: &str) -> String {
    format!(
        r#"<h1>{}</h1><div class="fragment" style="height: 600px;">Revealed later</div>"#,
        title
    )
}

/// Slide made of bare text, long enough to run far past the canvas
pub fn bare_text_slide() -> String {
    "All work and no play makes a very long slide. ".repeat(600)
}

/// Slide whose only oversized content is decorative or scrolls
pub fn decorated_slide(title: &str) -> String {
    format!(
        concat!(
            r#"<h1>{}</h1>"#,
            r#"<div style="height: 200px; overflow: auto;"><div style="height: 2000px;">Scrolls</div></div>"#,
            r#"<img src="data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7" "#,
            r#"style="position: absolute; top: 0; left: 0; width: 1400px; height: 900px; object-fit: cover;">"#,
            r#"<div aria-hidden="true" style="width: 1400px; height: 20px;"></div>"#,
            r#"<div data-overflow="ignore" style="height: 2000px;"></div>"#
        ),
        title
    )
}

// Just enough of the reveal.js API for navigation, configuration and print mode
const RUNTIME: &str = r#"
(function () {
    const slidesEl = document.querySelector('.reveal .slides');
    const horizontal = Array.from(slidesEl.children).filter(e => e.tagName === 'SECTION');
    horizontal.forEach(s => { if (s.querySelector('section')) s.classList.add('stack'); });
    const printing = /print-pdf/.test(window.location.search);
    let indices = { h: 0, v: 0 };

    const leafAt = (h, v) => {
        const group = horizontal[h];
        if (!group) return null;
        const nested = Array.from(group.children).filter(e => e.tagName === 'SECTION');
        return nested.length ? nested[v] || null : (v === 0 ? group : null);
    };

    if (printing) {
        document.documentElement.classList.add('print-pdf');
        const leaves = Array.from(slidesEl.querySelectorAll('section'))
            .filter(s => !s.classList.contains('stack'));
        for (const leaf of leaves) {
            const page = document.createElement('div');
            page.className = 'pdf-page';
            leaf.parentNode.insertBefore(page, leaf);
            page.appendChild(leaf);
        }
    }

    window.Reveal = {
        isReady: () => true,
        getConfig: () => ({ width: 960, height: 540 }),
        configure: () => {},
        getIndices: () => ({ h: indices.h, v: indices.v }),
        getCurrentSlide: () => leafAt(indices.h, indices.v),
        slide: (h, v, f) => {
            const current = leafAt(indices.h, indices.v);
            const next = leafAt(h, v || 0);
            if (!next) return;
            if (current) current.classList.remove('present');
            next.classList.add('present');
            const fragments = Array.from(next.querySelectorAll('.fragment'));
            fragments.forEach((el, i) => el.classList.toggle('visible', f !== undefined && i <= f));
            indices = { h: h, v: v || 0 };
        }
    };

    if (!printing) {
        const first = leafAt(0, 0);
        if (first) first.classList.add('present');
    }
})();
"#;

const STYLE: &str = r#"
html, body { margin: 0; padding: 0; }
.reveal .slides section { display: none; position: absolute; top: 0; left: 0;
    width: 960px; box-sizing: border-box; padding: 0; font-family: sans-serif; }
.reveal .slides section.stack { display: block; position: static; }
.reveal .slides section.present { display: block; }
html.print-pdf .reveal .slides section { display: block; position: static; }
.pdf-page { width: 960px; height: 540px; overflow: hidden; position: relative;
    page-break-after: always; }
@page { size: 960px 540px; margin: 0; }
.fragment { visibility: hidden; }
.fragment.visible { visibility: inherit; }
"#;

/// A deck made of horizontal groups; each group is one slide or a vertical stack
pub fn deck_html(groups: &[Vec<String>]) -> String {
    let mut body = String::new();
    for (h, group) in groups.iter().enumerate() {
        if group.len() == 1 {
            body.push_str(&format!(
                "<!-- Slide {} -->\n<section data-slide-id=\"s{}\">{}</section>\n",
                h + 1,
                h + 1,
                group[0]
            ));
        } else {
            body.push_str("<section>\n");
            for (v, slide) in group.iter().enumerate() {
                body.push_str(&format!(
                    "<section data-slide-id=\"s{}-{}\">{}</section>\n",
                    h + 1,
                    v + 1,
                    slide
                ));
            }
            body.push_str("</section>\n");
        }
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>{}</style>\n</head>\n<body>\n<div class=\"reveal\"><div class=\"slides\">\n{}</div></div>\n<script>{}</script>\n</body>\n</html>",
        STYLE, body, RUNTIME
    )
}

pub fn write_deck(dir: &Path, name: &str, groups: &[Vec<String>]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, deck_html(groups)).expect("Failed to write deck");
    path
}

/// Count page objects in a PDF produced by Chrome
pub fn count_pdf_pages(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
}
