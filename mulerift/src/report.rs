// mulerift/src/report.rs
//
// Markdown / JSON rendering of an AnalysisReport for the CLI.

use std::fmt::Write as _;

use crate::events::AnalysisReport;

const MAX_MEMBERS_SHOWN: usize = 8;

/// Serialize the full report (rings, account table, lookup, summary).
pub fn to_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn summary_line(report: &AnalysisReport) -> String {
    let s = &report.summary;
    format!(
        "rings={} cycle={} smurfing={} shell={} accounts={} largest={} max_score={:.1} fingerprint={}",
        s.total_rings,
        s.cycle_rings,
        s.smurfing_rings,
        s.shell_rings,
        s.accounts_flagged,
        s.largest_ring,
        s.max_risk_score,
        s.input_fingerprint,
    )
}

/// Markdown-formatted ring table.
pub fn to_markdown(report: &AnalysisReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "# MuleRift Fraud Ring Report\n");
    let _ = writeln!(
        out,
        "**Rings**: {}  **Accounts**: {}  **Max score**: {:.1}  **Input**: `{}`\n",
        s.total_rings, s.accounts_flagged, s.max_risk_score, s.input_fingerprint
    );
    let _ = writeln!(out, "| Pattern  | Rings |");
    let _ = writeln!(out, "|----------|-------|");
    let _ = writeln!(out, "| cycle    | {:5} |", s.cycle_rings);
    let _ = writeln!(out, "| smurfing | {:5} |", s.smurfing_rings);
    let _ = writeln!(out, "| shell    | {:5} |", s.shell_rings);
    let _ = writeln!(out);

    if report.fraud_rings.is_empty() {
        let _ = writeln!(out, "_No fraud rings detected._");
        return out;
    }

    let _ = writeln!(out, "## Rings\n");
    let _ = writeln!(out, "| Ring | Pattern | Score | Size | Sources | Members |");
    let _ = writeln!(out, "|------|---------|-------|------|---------|---------|");
    for ring in &report.fraud_rings {
        let shown: Vec<&str> = ring
            .member_accounts
            .iter()
            .take(MAX_MEMBERS_SHOWN)
            .map(String::as_str)
            .collect();
        let more = ring.member_accounts.len().saturating_sub(MAX_MEMBERS_SHOWN);
        let members = if more > 0 {
            format!("{} (+{} more)", shown.join(", "), more)
        } else {
            shown.join(", ")
        };
        let sources: Vec<String> =
            report.sources_of(&ring.ring_id).iter().map(|g| g.to_string()).collect();
        let _ = writeln!(
            out,
            "| {} | {} | {:.1} | {} | {} | {} |",
            ring.ring_id,
            ring.pattern_type,
            ring.risk_score,
            ring.member_accounts.len(),
            sources.join(", "),
            members
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RingEngine;
    use crate::events::{AccountScore, DetectionResults, ScoreMap};

    fn sample() -> AnalysisReport {
        let big: Vec<String> = (0..10).map(|i| format!("S{:02}", i)).collect();
        let d = DetectionResults {
            cycle_groups: vec![vec!["A".into(), "B".into(), "C".into()]],
            shell_groups: vec![big],
            ..Default::default()
        };
        let scores: ScoreMap = [("A".to_string(), AccountScore::new(33.0))].into_iter().collect();
        RingEngine::default().analyze(&d, &scores).unwrap()
    }

    #[test]
    fn markdown_lists_every_ring() {
        let md = to_markdown(&sample());
        assert!(md.contains("| RING_001 | cycle | 11.0 | 3 | cycle#0 | A, B, C |"));
        assert!(md.contains("| RING_002 | shell | 0.0 | 10 | shell#0 |"));
        assert!(md.contains("(+2 more)"));
    }

    #[test]
    fn markdown_for_empty_report() {
        let report = RingEngine::default()
            .analyze(&DetectionResults::default(), &ScoreMap::new())
            .unwrap();
        assert!(to_markdown(&report).contains("_No fraud rings detected._"));
    }

    #[test]
    fn json_uses_dashboard_field_names() {
        let v: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        let ring = &v["fraud_rings"][0];
        assert_eq!(ring["ring_id"], "RING_001");
        assert_eq!(ring["pattern_type"], "cycle");
        assert_eq!(ring["risk_score"], 11.0);
        assert_eq!(ring["member_accounts"][2], "C");
        assert_eq!(v["suspicious_accounts"][0]["account_id"], "A");
        assert_eq!(v["account_rings"]["S05"], "RING_002");
        assert_eq!(v["ring_sources"]["RING_001"][0]["kind"], "cycle");
        assert_eq!(v["ring_sources"]["RING_002"][0]["index"], 0);
        assert_eq!(v["summary"]["total_rings"], 2);
    }

    #[test]
    fn summary_line_has_counts() {
        let line = summary_line(&sample());
        assert!(line.starts_with("rings=2 cycle=1 smurfing=0 shell=1 accounts=13 largest=10"));
    }
}
