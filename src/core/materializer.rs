//! 扁平的點分隔 key 轉成每個語系一棵巢狀樹
//!
//! 第一輪掃描記錄每個陣列路徑出現過的最大索引，
//! 第二輪才建立節點，因此陣列長度在各語系之間一致。
//! key 衝突 (例如 `about.team` 同時是文字也是 `about.team.0.name` 的父節點)
//! 一律後寫入者勝出並記錄警告。

use crate::domain::model::{Locale, LocaleTrees, TranslationNode, TranslationRow};
use std::collections::{BTreeMap, HashMap};

/// 翻譯表欄位：key, de, fa, category
const MIN_TRANSLATION_COLUMNS: usize = 3;

/// 陣列索引上限；超過的列整列略過
pub const MAX_LIST_INDEX: usize = 10_000;

/// 解析後的表格列轉成翻譯列；略過表頭與欄位不足的列
pub fn rows_from_table(rows: &[Vec<String>]) -> Vec<TranslationRow> {
    rows.iter()
        .skip(1)
        .enumerate()
        .filter_map(|(index, row)| {
            if row.len() < MIN_TRANSLATION_COLUMNS {
                tracing::debug!("Skipping translation row {}: only {} columns", index + 2, row.len());
                return None;
            }
            let key = row[0].trim();
            if key.is_empty() {
                return None;
            }

            let mut values = BTreeMap::new();
            values.insert(Locale::De, row[1].clone());
            values.insert(Locale::Fa, row[2].clone());
            Some(TranslationRow {
                key: key.to_string(),
                values,
                category: row.get(3).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

pub fn materialize(rows: &[TranslationRow]) -> LocaleTrees {
    let array_lengths = collect_array_lengths(rows);
    let mut trees = LocaleTrees::new();

    for row in rows {
        let Some(segments) = usable_segments(&row.key) else {
            continue;
        };
        for locale in Locale::ALL {
            let value = row.value(locale).to_string();
            insert_path(trees.tree_mut(locale), &segments, value, &array_lengths, &row.key);
        }
    }

    tracing::debug!("Materialized {} translation rows", rows.len());
    trees
}

/// 空的 segment 一律忽略，`nav..home` 與 `nav.home` 是同一個 key
pub(crate) fn split_key(key: &str) -> Vec<&str> {
    key.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// 空 key 或索引超出上限時回傳 None
fn usable_segments(key: &str) -> Option<Vec<&str>> {
    let segments = split_key(key);
    if segments.is_empty() {
        return None;
    }
    let oversized = segments
        .iter()
        .filter(|segment| is_index(segment))
        .find(|segment| segment.parse::<usize>().map_or(true, |index| index > MAX_LIST_INDEX));
    if let Some(segment) = oversized {
        tracing::warn!(
            "⚠️ Skipping translation key '{}': index {} exceeds {}",
            key,
            segment,
            MAX_LIST_INDEX
        );
        return None;
    }
    Some(segments)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// 第一輪：父路徑 -> 陣列長度 (最大索引 + 1)
fn collect_array_lengths(rows: &[TranslationRow]) -> HashMap<String, usize> {
    let mut lengths: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let segments = split_key(&row.key);
        for (position, segment) in segments.iter().enumerate() {
            if !is_index(segment) {
                continue;
            }
            let Some(length_needed) = segment
                .parse::<usize>()
                .ok()
                .filter(|index| *index <= MAX_LIST_INDEX)
                .and_then(|index| index.checked_add(1))
            else {
                continue;
            };
            let parent = segments[..position].join(".");
            let length = lengths.entry(parent).or_insert(0);
            *length = (*length).max(length_needed);
        }
    }

    lengths
}

fn new_container(path: &str, next_segment: &str, array_lengths: &HashMap<String, usize>) -> TranslationNode {
    if is_index(next_segment) {
        let length = array_lengths.get(path).copied().unwrap_or(0);
        TranslationNode::List(vec![TranslationNode::empty_map(); length])
    } else {
        TranslationNode::empty_map()
    }
}

/// 第二輪：沿著 segment 往下建立節點並在最後一段寫入文字
fn insert_path(
    root: &mut TranslationNode,
    segments: &[&str],
    value: String,
    array_lengths: &HashMap<String, usize>,
    full_key: &str,
) {
    let mut node = root;
    let mut path = String::new();

    for (position, segment) in segments.iter().enumerate() {
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(segment);

        let is_last = position + 1 == segments.len();
        let next = segments.get(position + 1).copied().unwrap_or_default();

        let parent = node;
        let slot = child_slot(parent, segment, full_key);

        if is_last {
            if !matches!(&*slot, TranslationNode::Text(_)) && !is_empty_container(slot) {
                tracing::warn!(
                    "⚠️ Translation key '{}' replaces an existing branch with text",
                    full_key
                );
            }
            *slot = TranslationNode::Text(value);
            return;
        }

        let wants_list = is_index(next);
        let fits = match &*slot {
            TranslationNode::List(_) => wants_list,
            TranslationNode::Map(map) => !wants_list || map.is_empty(),
            TranslationNode::Text(_) => false,
        };
        if !fits {
            if let TranslationNode::Text(existing) = &*slot {
                if !existing.is_empty() {
                    tracing::warn!(
                        "⚠️ Translation key '{}' turns text at '{}' into a branch",
                        full_key,
                        path
                    );
                }
            } else {
                tracing::warn!(
                    "⚠️ Translation key '{}' changes the shape of '{}'",
                    full_key,
                    path
                );
            }
            *slot = new_container(&path, next, array_lengths);
        } else if wants_list && matches!(&*slot, TranslationNode::Map(_)) {
            // 預設填入的空 map 需要變成陣列
            *slot = new_container(&path, next, array_lengths);
        }

        node = slot;
    }
}

fn is_empty_container(node: &TranslationNode) -> bool {
    match node {
        TranslationNode::Map(map) => map.is_empty(),
        TranslationNode::List(items) => items.is_empty(),
        TranslationNode::Text(_) => false,
    }
}

/// 取得 (必要時建立) 父節點下的子節點
fn child_slot<'a>(parent: &'a mut TranslationNode, segment: &str, full_key: &str) -> &'a mut TranslationNode {
    if is_index(segment) && !matches!(&*parent, TranslationNode::List(_)) {
        tracing::warn!(
            "⚠️ Translation key '{}' uses index '{}' under a non-array node",
            full_key,
            segment
        );
    }
    if matches!(&*parent, TranslationNode::Text(_)) {
        *parent = TranslationNode::empty_map();
    }

    match parent {
        TranslationNode::List(items) => {
            let index = segment
                .parse::<usize>()
                .ok()
                .filter(|index| *index <= MAX_LIST_INDEX)
                .unwrap_or(items.len());
            if index >= items.len() {
                items.resize(index + 1, TranslationNode::empty_map());
            }
            &mut items[index]
        }
        TranslationNode::Map(map) => map
            .entry(segment.to_string())
            .or_insert_with(TranslationNode::empty_map),
        TranslationNode::Text(_) => unreachable!("text parents are replaced above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> TranslationNode {
        TranslationNode::Text(value.to_string())
    }

    #[test]
    fn test_array_paths_become_lists() {
        let rows = vec![
            TranslationRow::new("a.0.x", "1", "۱"),
            TranslationRow::new("a.1.x", "2", "۲"),
        ];
        let trees = materialize(&rows);

        for (locale, expected) in [(Locale::De, ["1", "2"]), (Locale::Fa, ["۱", "۲"])] {
            let list = trees.tree(locale).child("a").and_then(|n| n.as_list()).unwrap();
            assert_eq!(list.len(), 2);
            assert_eq!(list[0].child("x"), Some(&text(expected[0])));
            assert_eq!(list[1].child("x"), Some(&text(expected[1])));
        }
    }

    #[test]
    fn test_list_length_uses_max_index_not_first_seen() {
        let rows = vec![
            TranslationRow::new("team.0.name", "Ali", "علی"),
            TranslationRow::new("team.3.name", "Jonas", "یوناس"),
        ];
        let trees = materialize(&rows);

        let list = trees.tree(Locale::De).child("team").and_then(|n| n.as_list()).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[1], TranslationNode::empty_map());
        assert_eq!(list[3].child("name"), Some(&text("Jonas")));
    }

    #[test]
    fn test_nested_maps_and_lists() {
        let rows = vec![
            TranslationRow::new("services.items.0.title", "Finanzierung", "تامین مالی"),
            TranslationRow::new("services.items.0.points.1", "Schnell", "سریع"),
            TranslationRow::new("services.heading", "Leistungen", "خدمات"),
        ];
        let trees = materialize(&rows);
        let fa = trees.tree(Locale::Fa);

        let services = fa.child("services").unwrap();
        assert_eq!(services.child("heading"), Some(&text("خدمات")));
        let item = services.child("items").and_then(|n| n.child("0")).unwrap();
        assert_eq!(item.child("title"), Some(&text("تامین مالی")));
        let points = item.child("points").and_then(|n| n.as_list()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], text("سریع"));
    }

    #[test]
    fn test_prefix_collision_last_writer_wins() {
        let rows = vec![
            TranslationRow::new("about.team", "Team", "تیم"),
            TranslationRow::new("about.team.0.name", "Sara", "سارا"),
        ];
        let trees = materialize(&rows);
        let team = trees.tree(Locale::De).child("about").and_then(|n| n.child("team")).unwrap();
        assert_eq!(team.as_list().map(|l| l.len()), Some(1));

        let reversed: Vec<TranslationRow> = rows.into_iter().rev().collect();
        let trees = materialize(&reversed);
        let team = trees.tree(Locale::De).child("about").and_then(|n| n.child("team")).unwrap();
        assert_eq!(team, &text("Team"));
    }

    #[test]
    fn test_oversized_indices_skip_only_their_row() {
        let rows = vec![
            TranslationRow::new("a.18446744073709551615", "x", "y"),
            TranslationRow::new("a.99999999999999999999999", "x", "y"),
            TranslationRow::new("team.4000000000.name", "Riese", "غول"),
            TranslationRow::new("team.0.name", "Ali", "علی"),
            TranslationRow::new("nav.home", "Start", "خانه"),
        ];
        let trees = materialize(&rows);
        let de = trees.tree(Locale::De);

        assert_eq!(de.child("a"), None);
        let team = de.child("team").and_then(|n| n.as_list()).unwrap();
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].child("name"), Some(&text("Ali")));
        assert_eq!(de.child("nav").and_then(|n| n.child("home")), Some(&text("Start")));
    }

    #[test]
    fn test_index_at_limit_is_kept() {
        let key = format!("steps.{}", MAX_LIST_INDEX);
        let trees = materialize(&[TranslationRow::new(key, "Ende", "پایان")]);

        let steps = trees.tree(Locale::Fa).child("steps").and_then(|n| n.as_list()).unwrap();
        assert_eq!(steps.len(), MAX_LIST_INDEX + 1);
        assert_eq!(steps[MAX_LIST_INDEX], text("پایان"));
    }

    #[test]
    fn test_empty_segments_are_ignored() {
        let trees = materialize(&[TranslationRow::new("nav..home", "Start", "خانه")]);
        assert_eq!(
            trees.tree(Locale::De).child("nav").and_then(|n| n.child("home")),
            Some(&text("Start"))
        );
    }

    #[test]
    fn test_rows_from_table_skips_header_and_short_rows() {
        let table: Vec<Vec<String>> = vec![
            vec!["key", "de", "fa", "category"],
            vec!["nav.home", "Start", "خانه", "nav"],
            vec!["broken", "only-de"],
            vec!["", "x", "y"],
            vec!["footer.copy", "©", "©"],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(String::from).collect())
        .collect();

        let rows = rows_from_table(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "nav");
        assert_eq!(rows[1].value(Locale::Fa), "©");
        assert_eq!(rows[1].category, "");
    }
}
