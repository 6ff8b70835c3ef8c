use chrono::Local;
use url::Url;

use super::CommandError;
use crate::config::Config;
use crate::ledger::{Entry, LedgerStore};

const HEADERS: [&str; 4] = ["ID", "Timestamp", "Object", "Short"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const COLUMN_GAP: &str = "  ";

/// `minls list`
pub fn run(config: &Config) -> Result<(), CommandError> {
    let mut store = LedgerStore::new(config.store_options());
    store.init()?;
    let ledger = store.read_data()?;

    print!("{}", render_table(&ledger.entries));
    Ok(())
}

/// Render entries as a left-aligned text table, one line per entry
pub fn render_table(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return "No uploads recorded yet.\n".to_string();
    }

    let rows: Vec<[String; 4]> = entries
        .iter()
        .map(|entry| {
            [
                entry.id.to_string(),
                entry
                    .timestamp
                    .with_timezone(&Local)
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
                last_segment(&entry.object_link),
                last_segment(&entry.short_link),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Last non-empty path segment of `link`, `-` when there is none
fn last_segment(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: u64, object_link: &str, short_link: &str) -> Entry {
        Entry {
            id,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            object_link: object_link.to_string(),
            short_link: short_link.to_string(),
        }
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render_table(&[]), "No uploads recorded yet.\n");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(
            last_segment("https://minio.example.com/minls-public/abc.png"),
            "abc.png"
        );
        assert_eq!(
            last_segment("https://minio.example.com/minls-private/k.txt?X-Amz-Expires=604800"),
            "k.txt"
        );
        assert_eq!(last_segment("https://sho.rt/xyz/"), "xyz");
        assert_eq!(last_segment("https://sho.rt"), "-");
        assert_eq!(last_segment("not a link"), "-");
    }

    #[test]
    fn test_render_rows_aligned() {
        let entries = [
            entry(1, "https://store.example/b/first.png", "https://sho.rt/a"),
            entry(12, "https://store.example/b/second-upload.pdf", "https://sho.rt/bcd"),
        ];

        let table = render_table(&entries);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID  Timestamp"));
        assert!(lines[1].starts_with("1   "));
        assert!(lines[2].starts_with("12  "));
        assert!(lines[1].contains("first.png"));
        assert!(lines[2].ends_with("second-upload.pdf  bcd"));

        // Columns line up with the header
        let object_col = lines[0].find("Object").unwrap();
        assert_eq!(lines[1].find("first.png"), Some(object_col));
        assert_eq!(lines[2].find("second-upload.pdf"), Some(object_col));
    }
}
