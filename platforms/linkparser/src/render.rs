use lg_protocol::connector::split_label;

use crate::linkage::Linkage;

struct Drawn {
    left: usize,
    right: usize,
    label: String,
    level: usize,
}

/// The words and links a diagram shows, renumbered to the visible words.
struct Layout {
    words: Vec<String>,
    arcs: Vec<Drawn>,
}

fn layout(linkage: &Linkage) -> Layout {
    let options = linkage.options();
    let all = linkage.words();
    let n = all.len();
    let walls = options.display_walls();
    let shown: Vec<usize> = (0..n).filter(|&i| walls || (i != 0 && i + 1 != n)).collect();
    let column = |word: usize| shown.iter().position(|&w| w == word);

    let words = shown
        .iter()
        .map(|&i| if options.display_word_subscripts() { all[i].clone() } else { strip_word(&all[i]) })
        .collect();

    let mut arcs: Vec<Drawn> = linkage
        .raw_links()
        .iter()
        .filter_map(|link| {
            let label = if options.display_link_subscripts() {
                link.label.clone()
            } else {
                split_label(&link.label).0.to_string()
            };
            Some(Drawn { left: column(link.left)?, right: column(link.right)?, label, level: 0 })
        })
        .collect();

    // A link sits one level above everything nested under it
    let mut order: Vec<usize> = (0..arcs.len()).collect();
    order.sort_by_key(|&i| arcs[i].right - arcs[i].left);
    for &i in &order {
        let (left, right) = (arcs[i].left, arcs[i].right);
        let inner = arcs
            .iter()
            .enumerate()
            .filter(|(j, a)| *j != i && left <= a.left && a.right <= right && a.right - a.left < right - left)
            .map(|(_, a)| a.level)
            .max()
            .unwrap_or(0);
        arcs[i].level = inner + 1;
    }

    Layout { words, arcs }
}

fn strip_word(word: &str) -> String {
    match word.rfind('.') {
        Some(dot) if dot > 0 && word[dot + 1..].chars().all(|c| c.is_alphabetic() || c == '-') && dot + 1 < word.len() => {
            word[..dot].to_string()
        }
        _ => word.to_string(),
    }
}

/// Column of each word so every arc has room for its label.
fn positions(layout: &Layout) -> Vec<usize> {
    let mut pos: Vec<usize> = Vec::with_capacity(layout.words.len());
    for k in 0..layout.words.len() {
        let mut at = match k {
            0 => 0,
            _ => pos[k - 1] + layout.words[k - 1].chars().count() + 1,
        };
        for arc in layout.arcs.iter().filter(|a| a.right == k) {
            at = at.max(pos[arc.left] + arc.label.chars().count() + 3);
        }
        pos.push(at);
    }
    pos
}

/// ASCII arcs over the words, wrapped at `width` columns.
pub(crate) fn diagram(linkage: &Linkage, width: usize) -> String {
    let layout = layout(linkage);
    if layout.words.is_empty() {
        return String::new();
    }
    let pos = positions(&layout);
    let last = layout.words.len() - 1;
    let total = pos[last] + layout.words[last].chars().count();
    let top = layout.arcs.iter().map(|a| a.level).max().unwrap_or(0);

    let mut rows: Vec<Vec<char>> = Vec::new();
    for level in (1..=top).rev() {
        let mut row = vec![' '; total];
        for arc in layout.arcs.iter().filter(|a| a.level > level) {
            row[pos[arc.left]] = '|';
            row[pos[arc.right]] = '|';
        }
        for arc in layout.arcs.iter().filter(|a| a.level == level) {
            draw_arc(&mut row, pos[arc.left], pos[arc.right], &arc.label);
        }
        rows.push(row);
    }
    let mut stems = vec![' '; total];
    for arc in &layout.arcs {
        stems[pos[arc.left]] = '|';
        stems[pos[arc.right]] = '|';
    }
    rows.push(stems);

    let mut words = vec![' '; total];
    for (k, word) in layout.words.iter().enumerate() {
        for (offset, c) in word.chars().enumerate() {
            words[pos[k] + offset] = c;
        }
    }
    rows.push(words);

    // Cut into chunks that start at a word and fit the width
    let mut chunks = Vec::new();
    let mut first = 0;
    while first <= last {
        let mut end_word = first;
        while end_word < last && pos[end_word + 1] + layout.words[end_word + 1].chars().count() - pos[first] <= width {
            end_word += 1;
        }
        let start = pos[first];
        let end = if end_word == last { total } else { pos[end_word + 1] };
        chunks.push((start, end));
        first = end_word + 1;
    }

    let mut out = String::new();
    for (i, (start, end)) in chunks.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for row in &rows {
            let line: String = row[start..end].iter().collect();
            let line = line.trim_end();
            if !line.is_empty() {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

fn draw_arc(row: &mut [char], from: usize, to: usize, label: &str) {
    row[from] = '+';
    row[to] = '+';
    let inner = to - from - 1;
    let label_len = label.chars().count();
    let left = (inner - label_len) / 2;
    for (i, cell) in row[from + 1..to].iter_mut().enumerate() {
        *cell = '-';
        if i >= left && i < left + label_len {
            if let Some(c) = label.chars().nth(i - left) {
                *cell = c;
            }
        }
    }
}

/// One row per link of the current sublinkage: domains, left word and label,
/// the link label, right label and word.
pub(crate) fn links_and_domains(linkage: &Linkage) -> String {
    let words = linkage.words();
    let domains = linkage.domains();
    let max_domains = domains.iter().map(Vec::len).max().unwrap_or(0);
    let prefix_width = (4 * max_domains + 2).max(6);

    let mut out = String::new();
    for (link, names) in linkage.raw_links().iter().zip(domains) {
        let prefix: String = names.iter().map(|d| format!(" ({})", d)).collect();
        let dashes = "-".repeat(6usize.saturating_sub(link.label.len()));
        let row = format!(
            "{:<width$}{:<15}{:<8}<---{}{}>  {:<8}{}",
            prefix,
            words[link.left],
            link.left_connector.label(),
            link.label,
            dashes,
            link.right_connector.label(),
            words[link.right],
            width = prefix_width,
        );
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

/// The linkage as PostScript operands: words, links with levels, then the
/// sentence's row breaks. `full_doc` wraps it in an EPS header.
pub(crate) fn postscript(linkage: &Linkage, full_doc: bool) -> String {
    let layout = layout(linkage);
    let mut body = String::from("[");
    for word in &layout.words {
        body.push('(');
        body.push_str(&escape(word));
        body.push(')');
    }
    body.push_str("]\n[");
    for arc in &layout.arcs {
        body.push_str(&format!("[{} {} {} ({})]", arc.left, arc.right, arc.level - 1, escape(&arc.label)));
    }
    body.push_str("]\n[0]\n");

    if !full_doc {
        return body;
    }
    let mut doc = String::from("%!PS-Adobe-2.0 EPSF-1.2\n%%Pages: 1\n%%EndComments\n");
    doc.push_str(&body);
    doc.push_str("diagram\n\n%%EndDocument\n");
    doc
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}
