/// Most words placed on one display line, regardless of width
pub const MAX_WORDS_PER_LINE: usize = 10;
/// Wrapped lines shown at once, while typing and in review
pub const MAX_VISIBLE_LINES: usize = 3;

/// A half-open character range `[start, end)` of the target text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub start: usize,
    pub end: usize,
}

impl Line {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Greedily pack the words of `target` into lines of at most `width` columns.
///
/// A line keeps the space following its last word, so consecutive lines tile
/// the buffer. A word longer than `width` still gets a line of its own; words
/// are never split.
pub fn build_lines(target: &[char], width: usize) -> Vec<Line> {
    if width == 0 || target.is_empty() {
        return Vec::new();
    }
    let words = collect_words(target);
    let mut lines = Vec::with_capacity(words.len() / MAX_WORDS_PER_LINE + 1);

    let mut idx = 0;
    while idx < words.len() {
        let line_start = words[idx].start;
        let mut line_end = words[idx].end;
        let mut line_words = 0;
        let mut line_len = 0;

        while idx < words.len() && line_words < MAX_WORDS_PER_LINE {
            let word = words[idx];
            let word_len = word.end - word.start;
            if line_words > 0 && line_len + word_len + 1 > width {
                break;
            }
            if line_words > 0 {
                line_len += 1;
            }
            line_len += word_len;
            line_end = word.end;
            if target.get(word.end) == Some(&' ') {
                line_end += 1;
                line_len += 1;
            }
            line_words += 1;
            idx += 1;
        }
        lines.push(Line::new(line_start, line_end));
    }
    lines
}

fn collect_words(target: &[char]) -> Vec<Line> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, ch) in target.iter().enumerate() {
        match (*ch == ' ', start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                words.push(Line::new(s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(Line::new(s, target.len()));
    }
    words
}

/// Line holding character `index`, or the last line when `index` is past the end
pub fn line_index_for(lines: &[Line], index: usize) -> usize {
    lines
        .iter()
        .position(|line| line.contains(index))
        .unwrap_or(lines.len().saturating_sub(1))
}

/// First visible line while the cursor sits at `cursor`: one line of context
/// above the active line, never scrolled past the last full window.
pub fn default_start_line(lines: &[Line], cursor: usize) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let active = line_index_for(lines, cursor);
    active.saturating_sub(1).min(max_start_line(lines.len()))
}

/// Largest valid first-visible-line index for `line_count` lines
pub fn max_start_line(line_count: usize) -> usize {
    line_count.saturating_sub(MAX_VISIBLE_LINES)
}

/// Width of the line without its trailing spaces
pub fn line_visual_width(target: &[char], line: Line) -> usize {
    let end = line.end.min(target.len());
    if end <= line.start {
        return 0;
    }
    let trailing = target[line.start..end]
        .iter()
        .rev()
        .take_while(|c| **c == ' ')
        .count();
    end - line.start - trailing
}

/// Column budget for the text block on a terminal `width` columns wide
pub fn text_width_for(width: usize) -> usize {
    let mut text_width = width.saturating_sub(8).min(90);
    if text_width < 30 {
        text_width = width.saturating_sub(4);
    }
    if text_width < 10 {
        text_width = width;
    }
    text_width
}

/// Wrapped lines memoised on `(width, version)` of the target text.
///
/// The owner bumps its version whenever the target is replaced or extended;
/// lines are only served back when both width and version match.
#[derive(Debug, Default)]
pub struct LineCache {
    width: usize,
    version: u64,
    lines: Vec<Line>,
}

impl LineCache {
    pub fn lines(&mut self, target: &[char], width: usize, version: u64) -> &[Line] {
        if width == 0 {
            return &[];
        }
        if self.width != width || self.version != version {
            self.lines = build_lines(target, width);
            self.width = width;
            self.version = version;
        }
        &self.lines
    }

    /// Lines for `(width, version)` without rebuilding, `None` when stale
    pub fn get(&self, width: usize, version: u64) -> Option<&[Line]> {
        (width != 0 && self.width == width && self.version == version)
            .then_some(self.lines.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn render(target: &[char], lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| target[l.start..l.end].iter().collect())
            .collect()
    }

    #[test]
    fn test_build_lines_packs_by_width() {
        let target = chars("ab cd ef");
        let lines = build_lines(&target, 5);

        assert_eq!(
            lines,
            vec![Line::new(0, 3), Line::new(3, 6), Line::new(6, 8)]
        );
        assert_eq!(render(&target, &lines), vec!["ab ", "cd ", "ef"]);
    }

    #[test]
    fn test_lines_tile_the_buffer() {
        let target = chars("the quick brown fox jumps over the lazy dog again and again");
        for width in [1, 4, 9, 15, 30, 200] {
            let lines = build_lines(&target, width);
            assert_eq!(lines.first().map(|l| l.start), Some(0));
            assert_eq!(lines.last().map(|l| l.end), Some(target.len()));
            for pair in lines.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            let joined: String = render(&target, &lines).concat();
            assert_eq!(joined, target.iter().collect::<String>());
        }
    }

    #[test]
    fn test_long_word_is_never_split() {
        let target = chars("a extraordinarily b");
        let lines = build_lines(&target, 4);
        assert_eq!(render(&target, &lines), vec!["a ", "extraordinarily ", "b"]);
    }

    #[test]
    fn test_max_words_per_line() {
        let target = chars(&vec!["a"; 25].join(" "));
        let lines = build_lines(&target, 500);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], Line::new(0, 20));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(build_lines(&[], 10).is_empty());
        assert!(build_lines(&chars("ab"), 0).is_empty());
        assert!(build_lines(&chars("   "), 10).is_empty());
    }

    #[test]
    fn test_line_index_for() {
        let target = chars("ab cd ef");
        let lines = build_lines(&target, 5);
        assert_eq!(line_index_for(&lines, 0), 0);
        assert_eq!(line_index_for(&lines, 2), 0);
        assert_eq!(line_index_for(&lines, 3), 1);
        assert_eq!(line_index_for(&lines, 7), 2);
        assert_eq!(line_index_for(&lines, 8), 2);
        assert_eq!(line_index_for(&lines, 100), 2);
        assert_eq!(line_index_for(&[], 3), 0);
    }

    #[test]
    fn test_default_start_line() {
        let lines = (0..7).map(|i| Line::new(i * 3, i * 3 + 3)).collect::<Vec<_>>();
        assert_eq!(default_start_line(&lines, 0), 0);
        assert_eq!(default_start_line(&lines, 4), 0);
        assert_eq!(default_start_line(&lines, 7), 1);
        assert_eq!(default_start_line(&lines, 13), 3);
        // never past the last full window
        assert_eq!(default_start_line(&lines, 20), 4);
        assert_eq!(default_start_line(&lines[..2], 5), 0);
        assert_eq!(default_start_line(&[], 5), 0);
    }

    #[test]
    fn test_line_visual_width() {
        let target = chars("ab  cd");
        assert_eq!(line_visual_width(&target, Line::new(0, 4)), 2);
        assert_eq!(line_visual_width(&target, Line::new(4, 6)), 2);
        assert_eq!(line_visual_width(&target, Line::new(2, 4)), 0);
    }

    #[test]
    fn test_text_width_for() {
        assert_eq!(text_width_for(200), 90);
        assert_eq!(text_width_for(80), 72);
        assert_eq!(text_width_for(36), 32);
        assert_eq!(text_width_for(12), 12);
        assert_eq!(text_width_for(6), 6);
    }

    #[test]
    fn test_cache_rebuilds_on_version_or_width() {
        let mut cache = LineCache::default();
        let short = chars("ab cd ef");
        assert_eq!(cache.lines(&short, 5, 1).len(), 3);

        // same key serves the memoised lines even if handed other text
        let long = chars("ab cd ef gh ij");
        assert_eq!(cache.lines(&long, 5, 1).len(), 3);

        assert_eq!(cache.lines(&long, 5, 2).len(), 5);
        assert_eq!(cache.lines(&long, 100, 2).len(), 1);
        assert!(cache.lines(&long, 0, 2).is_empty());

        assert_eq!(cache.get(100, 2).map(<[Line]>::len), Some(1));
        assert_eq!(cache.get(100, 3), None);
        assert_eq!(cache.get(5, 2), None);
    }
}
