//! Search-term highlighting over text nodes.

use regex::{Regex, RegexBuilder};

use crate::dom::{Element, Node};

/// Tag wrapped around highlighted occurrences.
pub const EMPHASIS_TAG: &str = "strong";

/// Case-insensitive matcher for a literal search term.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    /// Build a matcher for `term`. Regex metacharacters in the term match
    /// literally; an empty or blank term highlights nothing.
    pub fn new(term: &str) -> Self {
        let pattern = if term.trim().is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self { pattern }
    }

    /// Split `text` into text nodes and `<strong>` nodes, one per occurrence.
    /// The matched text keeps its original case.
    pub fn nodes(&self, text: &str) -> Vec<Node> {
        let Some(pattern) = &self.pattern else {
            return vec![Node::text(text)];
        };

        let mut nodes = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(text) {
            if m.start() > last {
                nodes.push(Node::text(&text[last..m.start()]));
            }
            nodes.push(Element::new(EMPHASIS_TAG).text(m.as_str()).into());
            last = m.end();
        }
        if last < text.len() || nodes.is_empty() {
            nodes.push(Node::text(&text[last..]));
        }
        nodes
    }

    /// Highlight every text node under `el` that is not already inside a
    /// `<strong>`. Running it again on its own output changes nothing.
    pub fn apply(&self, el: &mut Element) {
        if self.pattern.is_none() || el.tag() == EMPHASIS_TAG {
            return;
        }
        let children = std::mem::take(el.children_mut());
        for child in children {
            match child {
                Node::Text(text) => el.children_mut().extend(self.nodes(&text)),
                Node::Element(mut inner) => {
                    self.apply(&mut inner);
                    el.push(inner);
                }
            }
        }
    }
}

/// Set `el`'s content to `value` with occurrences of `term` emphasised.
pub fn set_highlighted(el: &mut Element, value: &str, term: &str) {
    el.clear_children();
    el.children_mut().extend(Highlighter::new(term).nodes(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighted(value: &str, term: &str) -> String {
        let mut p = Element::new("p");
        set_highlighted(&mut p, value, term);
        p.inner_html()
    }

    #[test]
    fn wraps_each_occurrence() {
        assert_eq!(highlighted("text of d", "tex"), "<strong>tex</strong>t of d");
        assert_eq!(
            highlighted("Text and more text", "text"),
            "<strong>Text</strong> and more <strong>text</strong>"
        );
    }

    #[test]
    fn missing_term_leaves_text_unchanged() {
        assert_eq!(highlighted("nothing here", "zzz"), "nothing here");
        assert_eq!(highlighted("nothing here", ""), "nothing here");
        assert_eq!(highlighted("", "a"), "");
    }

    #[test]
    fn index_data_is_never_markup() {
        assert_eq!(
            highlighted("<img src=x onerror=alert(1)> tex", "tex"),
            "&lt;img src=x onerror=alert(1)&gt; <strong>tex</strong>"
        );
        // A term that looks like markup is matched as text.
        assert_eq!(highlighted("a <b> c", "<b>"), "a <strong>&lt;b&gt;</strong> c");
    }

    #[test]
    fn regex_metacharacters_match_literally() {
        assert_eq!(highlighted("c++ (beta)", "c++"), "<strong>c++</strong> (beta)");
        assert_eq!(highlighted("a.c abc", "a.c"), "<strong>a.c</strong> abc");
    }

    #[test]
    fn applying_twice_does_not_double_wrap() {
        let highlighter = Highlighter::new("tex");
        let mut p = Element::new("p").text("text of d");

        highlighter.apply(&mut p);
        let once = p.inner_html();
        highlighter.apply(&mut p);

        assert_eq!(once, "<strong>tex</strong>t of d");
        assert_eq!(p.inner_html(), once);
    }
}
