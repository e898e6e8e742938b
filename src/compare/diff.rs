//! Per-page link diff between a baseline and an upgraded page

use crate::config::CompareBy;
use crate::output::LinkRecord;
use crate::state::LinkStatus;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use url::Url;

/// Note attached to a target-changed difference
pub const NOTE_TARGET_CHANGED: &str = "Target changed for same anchor text";

/// Note attached to a broken upgraded link
pub const NOTE_UPGRADED_BROKEN: &str = "Upgraded link broken";

/// Category of a link difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    /// Present on the baseline page only
    Missing,
    /// Present on the upgraded page only
    Extra,
    /// Present on both pages but wrong on the upgraded one
    Wrong,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "Missing",
            Self::Extra => "Extra",
            Self::Wrong => "Wrong",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between the two pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDiff {
    pub kind: DiffKind,
    pub link_text: String,

    /// Baseline target(s); several are joined with ` | `
    pub baseline_target: String,

    /// Upgraded target(s); several are joined with ` | `
    pub upgraded_target: String,

    pub baseline_status: String,
    pub upgraded_status: String,
    pub note: String,
}

/// Number of differences per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub missing: u32,
    pub extra: u32,
    pub wrong: u32,
}

impl DiffCounts {
    pub fn total(&self) -> u32 {
        self.missing + self.extra + self.wrong
    }

    fn count(&mut self, kind: DiffKind) {
        match kind {
            DiffKind::Missing => self.missing += 1,
            DiffKind::Extra => self.extra += 1,
            DiffKind::Wrong => self.wrong += 1,
        }
    }
}

impl std::ops::AddAssign for DiffCounts {
    fn add_assign(&mut self, other: Self) {
        self.missing += other.missing;
        self.extra += other.extra;
        self.wrong += other.wrong;
    }
}

/// Key a link is matched by, or `None` if the link takes no part in diffs
///
/// Only web links that were processed take part: skipped, malformed and
/// non-web anchors have no key.
pub fn link_compare_key(link: &LinkRecord, compare_by: CompareBy) -> Option<&str> {
    if link.http_status.is_skipped() {
        return None;
    }
    let resolved = link.resolved_url.as_deref()?;
    match compare_by {
        CompareBy::FinalUrl => Some(resolved),
        CompareBy::AbsoluteUrl => link.absolute_url.as_deref(),
    }
}

/// Builds the upgraded page URL for a baseline page
///
/// Keeps the baseline path; the query is carried over only when queries are
/// kept. The fragment is always dropped.
pub fn map_to_upgraded(baseline_page: &Url, upgraded_origin: &Url, keep_query: bool) -> Url {
    let mut mapped = upgraded_origin.clone();
    mapped.set_path(baseline_page.path());
    mapped.set_query(if keep_query {
        baseline_page.query()
    } else {
        None
    });
    mapped.set_fragment(None);
    mapped
}

/// Moves links that point at `from`'s origin onto `to`'s origin
///
/// Applied to the upgraded page's links so that same-path internal links on
/// both sites share a key. Links to any other origin are left alone.
pub fn rebase_onto(links: &mut [LinkRecord], from: &Url, to: &Url) {
    for link in links {
        for field in [&mut link.absolute_url, &mut link.resolved_url] {
            if let Some(rebased) = field.as_deref().and_then(|u| rebase_url(u, from, to)) {
                *field = Some(rebased);
            }
        }
    }
}

fn rebase_url(raw: &str, from: &Url, to: &Url) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let same_origin = url.scheme() == from.scheme()
        && url.host_str() == from.host_str()
        && url.port_or_known_default() == from.port_or_known_default();
    if !same_origin {
        return None;
    }
    let mut rebased = to.clone();
    rebased.set_path(url.path());
    rebased.set_query(url.query());
    rebased.set_fragment(url.fragment());
    Some(rebased.to_string())
}

/// Compares the links of two pages
#[derive(Debug, Clone, Copy)]
pub struct LinkDiffer {
    compare_by: CompareBy,
    resolution_enabled: bool,
}

impl LinkDiffer {
    /// Creates a differ
    ///
    /// When resolution is disabled the comparison is always keyed by the
    /// absolute URL, and unresolved upgraded links are not reported as broken.
    pub fn new(compare_by: CompareBy, resolution_enabled: bool) -> Self {
        let compare_by = if resolution_enabled {
            compare_by
        } else {
            CompareBy::AbsoluteUrl
        };
        Self {
            compare_by,
            resolution_enabled,
        }
    }

    /// Effective comparison key
    pub fn compare_by(&self) -> CompareBy {
        self.compare_by
    }

    /// Diffs a baseline page's links against the upgraded page's links
    ///
    /// # Rules
    ///
    /// 1. Same non-empty anchor text pointing at different key sets is one
    ///    `Wrong` difference; those keys are then left out of rules 2 and 3.
    /// 2. A key on both pages whose upgraded link is broken is `Wrong`.
    /// 3. Keys only on the baseline are `Missing`, keys only on the upgraded
    ///    page are `Extra`.
    ///
    /// Each rule reports in sorted key (or text) order.
    pub fn compare(
        &self,
        baseline: &[LinkRecord],
        upgraded: &[LinkRecord],
    ) -> (Vec<LinkDiff>, DiffCounts) {
        let mut diffs = Vec::new();
        let mut counts = DiffCounts::default();
        let mut push = |diff: LinkDiff| {
            counts.count(diff.kind);
            diffs.push(diff);
        };

        let base_by_key = self.index(baseline);
        let upg_by_key = self.index(upgraded);
        let base_text = self.text_map(baseline);
        let upg_text = self.text_map(upgraded);

        let mut changed_keys: BTreeSet<&str> = BTreeSet::new();
        for (text, base_keys) in &base_text {
            let Some(upg_keys) = upg_text.get(text) else {
                continue;
            };
            if base_keys == upg_keys {
                continue;
            }
            push(LinkDiff {
                kind: DiffKind::Wrong,
                link_text: text.to_string(),
                baseline_target: join_targets(base_keys),
                upgraded_target: join_targets(upg_keys),
                baseline_status: String::new(),
                upgraded_status: String::new(),
                note: NOTE_TARGET_CHANGED.to_string(),
            });
            changed_keys.extend(base_keys.iter().copied());
            changed_keys.extend(upg_keys.iter().copied());
        }

        let base_keys: BTreeSet<&str> = base_by_key
            .keys()
            .copied()
            .filter(|k| !changed_keys.contains(k))
            .collect();
        let upg_keys: BTreeSet<&str> = upg_by_key
            .keys()
            .copied()
            .filter(|k| !changed_keys.contains(k))
            .collect();

        for key in base_keys.intersection(&upg_keys) {
            let (b, u) = (base_by_key[key], upg_by_key[key]);
            if self.is_broken(&u.http_status) {
                push(LinkDiff {
                    kind: DiffKind::Wrong,
                    link_text: u.link_text.clone(),
                    baseline_target: key.to_string(),
                    upgraded_target: key.to_string(),
                    baseline_status: b.http_status.to_string(),
                    upgraded_status: u.http_status.to_string(),
                    note: NOTE_UPGRADED_BROKEN.to_string(),
                });
            }
        }

        for key in base_keys.difference(&upg_keys) {
            let b = base_by_key[key];
            push(LinkDiff {
                kind: DiffKind::Missing,
                link_text: b.link_text.clone(),
                baseline_target: key.to_string(),
                upgraded_target: String::new(),
                baseline_status: b.http_status.to_string(),
                upgraded_status: String::new(),
                note: String::new(),
            });
        }

        for key in upg_keys.difference(&base_keys) {
            let u = upg_by_key[key];
            push(LinkDiff {
                kind: DiffKind::Extra,
                link_text: u.link_text.clone(),
                baseline_target: String::new(),
                upgraded_target: key.to_string(),
                baseline_status: String::new(),
                upgraded_status: u.http_status.to_string(),
                note: String::new(),
            });
        }

        (diffs, counts)
    }

    /// Last occurrence of each key wins
    fn index<'a>(&self, links: &'a [LinkRecord]) -> HashMap<&'a str, &'a LinkRecord> {
        links
            .iter()
            .filter_map(|l| link_compare_key(l, self.compare_by).map(|k| (k, l)))
            .collect()
    }

    fn text_map<'a>(&self, links: &'a [LinkRecord]) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
        let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for link in links {
            let text = link.link_text.trim();
            if text.is_empty() {
                continue;
            }
            if let Some(key) = link_compare_key(link, self.compare_by) {
                map.entry(text).or_default().insert(key);
            }
        }
        map
    }

    fn is_broken(&self, status: &LinkStatus) -> bool {
        match status {
            LinkStatus::NotResolved => self.resolution_enabled,
            other => other.is_broken(),
        }
    }
}

fn join_targets(keys: &BTreeSet<&str>) -> String {
    keys.iter().copied().collect::<Vec<_>>().join(" | ")
}
