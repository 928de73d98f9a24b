//! Reconciles the mosaic's panels with the sheet-to-panel mapping.
//!
//! The tolerance is asymmetric: a mapped panel id with no grid cell is fatal
//! (there is nowhere to draw it), while a grid panel with no mapping only
//! produces a warning and an empty placeholder.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result, Warning};
use crate::mosaic::{LEGEND_TOKEN, Mosaic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PanelRole {
    /// Receives content from `sheets` and a visible label glyph.
    Labeled { label: String, sheets: Vec<String> },
    /// In the grid but unmapped: reserved geometry only.
    Placeholder,
    /// The reserved legend area.
    Legend,
}

/// Role of every panel in the mosaic, keyed (and therefore ordered) by token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    panels: BTreeMap<char, PanelRole>,
}

impl LabelSet {
    pub fn role(&self, token: char) -> Option<&PanelRole> {
        self.panels.get(&token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &PanelRole)> {
        self.panels.iter().map(|(token, role)| (*token, role))
    }

    /// `(token, label)` for every panel that gets a visible label.
    pub fn labeled(&self) -> impl Iterator<Item = (char, &str)> {
        self.panels.iter().filter_map(|(token, role)| match role {
            PanelRole::Labeled { label, .. } => Some((*token, label.as_str())),
            _ => None,
        })
    }

    pub fn placeholders(&self) -> impl Iterator<Item = char> + '_ {
        self.panels
            .iter()
            .filter(|(_, role)| matches!(role, PanelRole::Placeholder))
            .map(|(token, _)| *token)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub labels: LabelSet,
    pub warnings: Vec<Warning>,
}

/// Resolves panel roles from the mosaic and a `sheet -> token` mapping.
/// `overrides` replaces the display text of a labeled panel; by default the
/// token itself is the glyph.
pub fn resolve_labels(
    mosaic: &Mosaic,
    sheet2panel: &BTreeMap<String, String>,
    overrides: &BTreeMap<char, String>,
) -> Result<Resolution> {
    let mut sheets_by_token: BTreeMap<char, Vec<String>> = BTreeMap::new();
    for (sheet, value) in sheet2panel {
        let mut chars = value.chars();
        let token = match (chars.next(), chars.next()) {
            (Some(token), None) => token,
            _ => {
                return Err(Error::InvalidToken {
                    sheet: sheet.clone(),
                    value: value.clone(),
                });
            }
        };
        if token == LEGEND_TOKEN {
            debug!(sheet = %sheet, "sheet mapped to the legend panel is not drawn");
            continue;
        }
        sheets_by_token.entry(token).or_default().push(sheet.clone());
    }

    let unplaced: Vec<char> = sheets_by_token
        .keys()
        .copied()
        .filter(|token| !mosaic.contains(*token))
        .collect();
    if !unplaced.is_empty() {
        return Err(Error::UnplacedPanel { tokens: unplaced });
    }

    let mut panels = BTreeMap::new();
    let mut warnings = Vec::new();
    for token in mosaic.tokens() {
        let role = if token == LEGEND_TOKEN {
            PanelRole::Legend
        } else if let Some(sheets) = sheets_by_token.remove(&token) {
            let label = overrides
                .get(&token)
                .cloned()
                .unwrap_or_else(|| token.to_string());
            PanelRole::Labeled { label, sheets }
        } else {
            let warning = Warning::UnlabeledPanel { token };
            warn!(token = %token, "{warning}");
            warnings.push(warning);
            PanelRole::Placeholder
        };
        panels.insert(token, role);
    }

    let unused: BTreeSet<char> = overrides
        .keys()
        .copied()
        .filter(|token| !matches!(panels.get(token), Some(PanelRole::Labeled { .. })))
        .collect();
    if !unused.is_empty() {
        debug!(tokens = ?unused, "label overrides for unlabeled panels ignored");
    }

    Ok(Resolution {
        labels: LabelSet { panels },
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(sheet, token)| (sheet.to_string(), token.to_string()))
            .collect()
    }

    #[test]
    fn fully_mapped_grid_has_no_warnings() {
        let mosaic = Mosaic::parse(&["AB", "AB"]).unwrap();
        let res = resolve_labels(
            &mosaic,
            &mapping(&[("s1", "A"), ("s2", "B")]),
            &BTreeMap::new(),
        )
        .unwrap();
        assert!(res.warnings.is_empty());
        assert_eq!(res.labels.labeled().collect::<Vec<_>>(), vec![('A', "A"), ('B', "B")]);
    }

    #[test]
    fn grid_only_tokens_become_placeholders_with_one_warning_each() {
        let mosaic = Mosaic::parse(&["AABB", "CCBB", "DDDE"]).unwrap();
        let res = resolve_labels(&mosaic, &mapping(&[("exp1", "A")]), &BTreeMap::new()).unwrap();
        assert_eq!(
            res.warnings,
            vec![
                Warning::UnlabeledPanel { token: 'B' },
                Warning::UnlabeledPanel { token: 'C' },
                Warning::UnlabeledPanel { token: 'D' },
                Warning::UnlabeledPanel { token: 'E' },
            ]
        );
        assert_eq!(res.labels.placeholders().collect::<Vec<_>>(), vec!['B', 'C', 'D', 'E']);
        assert_eq!(
            res.labels.role('A'),
            Some(&PanelRole::Labeled {
                label: "A".to_string(),
                sheets: vec!["exp1".to_string()]
            })
        );
    }

    #[test]
    fn mapped_tokens_missing_from_grid_are_fatal() {
        let mosaic = Mosaic::parse(&["II0J"]).unwrap();
        let err = resolve_labels(
            &mosaic,
            &mapping(&[("a", "I"), ("b", "J"), ("c", "K")]),
            &BTreeMap::new(),
        )
        .unwrap_err();
        match err {
            Error::UnplacedPanel { tokens } => assert_eq!(tokens, vec!['K']),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn legend_token_is_never_a_labeling_error() {
        let mosaic = Mosaic::parse(&["A0"]).unwrap();
        let res = resolve_labels(&mosaic, &mapping(&[("a", "A")]), &BTreeMap::new()).unwrap();
        assert!(res.warnings.is_empty());
        assert_eq!(res.labels.role('0'), Some(&PanelRole::Legend));

        // Mapping a sheet onto '0' is neither fatal nor a label.
        let mosaic = Mosaic::parse(&["AB"]).unwrap();
        let res = resolve_labels(
            &mosaic,
            &mapping(&[("a", "A"), ("b", "B"), ("legend", "0")]),
            &BTreeMap::new(),
        )
        .unwrap();
        assert!(res.warnings.is_empty());
        assert_eq!(res.labels.labeled().count(), 2);
    }

    #[test]
    fn several_sheets_can_share_a_panel() {
        let mosaic = Mosaic::parse(&["A"]).unwrap();
        let res = resolve_labels(&mosaic, &mapping(&[("x1", "A"), ("x2", "A")]), &BTreeMap::new())
            .unwrap();
        match res.labels.role('A') {
            Some(PanelRole::Labeled { sheets, .. }) => assert_eq!(sheets, &["x1", "x2"]),
            other => panic!("unexpected role: {other:?}"),
        }
    }

    #[test]
    fn multi_character_panel_ids_are_rejected() {
        let mosaic = Mosaic::parse(&["A"]).unwrap();
        let err = resolve_labels(&mosaic, &mapping(&[("a", "AB")]), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
    }

    #[test]
    fn overrides_change_display_text_only() {
        let mosaic = Mosaic::parse(&["AB"]).unwrap();
        let overrides = BTreeMap::from([('A', "(a)".to_string()), ('B', "(b)".to_string())]);
        let res = resolve_labels(&mosaic, &mapping(&[("s", "A")]), &overrides).unwrap();
        assert_eq!(res.labels.labeled().collect::<Vec<_>>(), vec![('A', "(a)")]);
        assert_eq!(res.labels.role('B'), Some(&PanelRole::Placeholder));
    }
}
