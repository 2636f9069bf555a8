use serde::Serialize;

use crate::catalog::TrackingElementSet;

/// A record that was found in a catalog response but could not be used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRecord {
    /// Name line, or the first element line when the record is unnamed.
    pub label: String,
    pub reason: String,
}

/// Parses a catalog body that may mix named (3-line) and unnamed (2-line)
/// records. Lines that belong to no record are ignored.
pub fn parse_catalog(content: &str) -> (Vec<TrackingElementSet>, Vec<MalformedRecord>) {
    let mut sets = Vec::new();
    let mut rejected = Vec::new();

    for record in split_records(content) {
        let (name, line1, line2) = match record {
            Ok(lines) => lines,
            Err(incomplete) => {
                log::warn!("Skipping element record {}: {}", incomplete.label, incomplete.reason);
                rejected.push(incomplete);
                continue;
            }
        };
        let label = name.clone().unwrap_or_else(|| line1.to_string());
        match TrackingElementSet::from_tle(name, line1, line2) {
            Ok(set) => sets.push(set),
            Err(e) => {
                log::warn!("Skipping element record {}: {}", label, e);
                rejected.push(MalformedRecord {
                    label,
                    reason: e.to_string(),
                });
            }
        }
    }

    (sets, rejected)
}

type RecordLines<'a> = (Option<String>, &'a str, &'a str);

/// Groups lines into records. A record that starts but is cut short comes
/// back as an error so it can be reported.
fn split_records(content: &str) -> Vec<Result<RecordLines<'_>, MalformedRecord>> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let is_line1 = |i: usize| lines.get(i).is_some_and(|l| l.starts_with("1 "));
    let is_line2 = |i: usize| lines.get(i).is_some_and(|l| l.starts_with("2 "));
    let incomplete = |label: &str, reason: &str| MalformedRecord {
        label: label.to_string(),
        reason: reason.to_string(),
    };

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_line1(i) {
            if is_line2(i + 1) {
                result.push(Ok((None, lines[i], lines[i + 1])));
                i += 2;
            } else {
                result.push(Err(incomplete(lines[i], "missing line 2")));
                i += 1;
            }
        } else if is_line2(i) {
            result.push(Err(incomplete(lines[i], "missing line 1")));
            i += 1;
        } else if is_line1(i + 1) {
            if is_line2(i + 2) {
                result.push(Ok((Some(lines[i].to_string()), lines[i + 1], lines[i + 2])));
                i += 3;
            } else {
                result.push(Err(incomplete(lines[i], "missing line 2")));
                i += 2;
            }
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;

    #[test]
    fn mixes_named_and_unnamed_records() {
        let body = format!(
            "{}\n{}\n{}\n\n{}\n{}\n",
            "ISS (ZARYA)",
            fixtures::ISS_LINE1,
            fixtures::ISS_LINE2,
            fixtures::HST_LINE1,
            fixtures::HST_LINE2
        );
        let (sets, rejected) = parse_catalog(&body);
        assert!(rejected.is_empty());
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "ISS (ZARYA)");
        assert_eq!(sets[1].catalog_id, 20580);
        assert_eq!(sets[1].name, "NORAD 20580");
    }

    #[test]
    fn skips_malformed_record_and_keeps_the_rest() {
        let truncated = &fixtures::HST_LINE2[..50];
        let body = format!(
            "BROKEN\n{}\n{}\nISS (ZARYA)\n{}\n{}\n",
            fixtures::HST_LINE1,
            truncated,
            fixtures::ISS_LINE1,
            fixtures::ISS_LINE2
        );
        let (sets, rejected) = parse_catalog(&body);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].catalog_id, 25544);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].label, "BROKEN");
    }

    #[test]
    fn ignores_text_without_records() {
        let (sets, rejected) = parse_catalog("No GP data found\n");
        assert!(sets.is_empty());
        assert!(rejected.is_empty());
    }

    #[test]
    fn reports_record_cut_short() {
        let body = format!("ISS (ZARYA)\n{}\n", fixtures::ISS_LINE1);
        let (sets, rejected) = parse_catalog(&body);
        assert!(sets.is_empty());
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].label, "ISS (ZARYA)");
        assert_eq!(rejected[0].reason, "missing line 2");

        let (_, rejected) = parse_catalog(fixtures::HST_LINE1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].label, fixtures::HST_LINE1);
    }

    #[test]
    fn truncated_tail_does_not_hide_earlier_records() {
        let body = format!(
            "{}\n{}\nHST\n{}\n",
            fixtures::ISS_LINE1,
            fixtures::ISS_LINE2,
            fixtures::HST_LINE1
        );
        let (sets, rejected) = parse_catalog(&body);
        assert_eq!(sets.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].label, "HST");
    }
}
