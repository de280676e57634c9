//! Citation-share math: URL → domain normalization and per-domain share
//! percentages for a report.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// One domain's slice of a report's citations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainShare {
    pub domain: String,
    pub citation_count: u32,
    /// Percentage of all citations, rounded to two decimal places.
    pub share_pct: Decimal,
    /// 1-based, descending by share; ties broken alphabetically.
    pub rank: u32,
}

/// Normalize a citation URL to a bare lowercase domain.
///
/// Strips the scheme, credentials, `www.` prefix, port, and everything after
/// the host. Returns `None` for strings with no recognizable host.
#[must_use]
pub fn normalize_domain(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);
    let without_creds = without_scheme
        .split_once('@')
        .map_or(without_scheme, |(_, rest)| rest);
    let host = without_creds
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();

    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.is_empty() || !host.contains('.') {
        return None;
    }
    Some(host.to_string())
}

/// Count citations per domain and compute share percentages and ranks.
///
/// Input is the full multiset of citation URLs for a report (duplicates
/// intact — each citation counts once). URLs without a recognizable host are
/// dropped. Output is ordered by rank.
#[must_use]
pub fn compute_citation_shares(urls: &[String]) -> Vec<DomainShare> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for url in urls {
        if let Some(domain) = normalize_domain(url) {
            *counts.entry(domain).or_insert(0) += 1;
        }
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<(String, u32)> = counts.into_iter().collect();
    shares.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    shares
        .into_iter()
        .enumerate()
        .map(|(i, (domain, count))| DomainShare {
            domain,
            citation_count: count,
            share_pct: {
                let mut pct = (Decimal::from(count) * Decimal::from(100)
                    / Decimal::from(total))
                .round_dp(2);
                pct.rescale(2);
                pct
            },
            rank: u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_domain("https://www.acme.com/docs/setup?ref=1"),
            Some("acme.com".to_string())
        );
    }

    #[test]
    fn normalize_strips_port_and_lowercases() {
        assert_eq!(
            normalize_domain("HTTP://Blog.Acme.COM:8080/post"),
            Some("blog.acme.com".to_string())
        );
    }

    #[test]
    fn normalize_handles_bare_domains() {
        assert_eq!(normalize_domain("acme.com"), Some("acme.com".to_string()));
    }

    #[test]
    fn normalize_rejects_hostless_strings() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("   "), None);
        assert_eq!(normalize_domain("not a url"), None);
        assert_eq!(normalize_domain("localhost"), None);
    }

    #[test]
    fn shares_for_forty_sixty_split() {
        let mut urls = Vec::new();
        for i in 0..4 {
            urls.push(format!("https://www.acme.com/page{i}"));
        }
        for i in 0..6 {
            urls.push(format!("https://betacorp.com/page{i}"));
        }

        let shares = compute_citation_shares(&urls);
        assert_eq!(shares.len(), 2);

        // Descending by share: BetaCorp's 60% outranks Acme's 40%.
        assert_eq!(shares[0].domain, "betacorp.com");
        assert_eq!(shares[0].citation_count, 6);
        assert_eq!(shares[0].share_pct.to_string(), "60.00");
        assert_eq!(shares[0].rank, 1);

        assert_eq!(shares[1].domain, "acme.com");
        assert_eq!(shares[1].citation_count, 4);
        assert_eq!(shares[1].share_pct.to_string(), "40.00");
        assert_eq!(shares[1].rank, 2);
    }

    #[test]
    fn recomputation_is_stable() {
        let urls = vec![
            "https://acme.com/a".to_string(),
            "https://acme.com/b".to_string(),
            "https://betacorp.com/c".to_string(),
        ];
        let first = compute_citation_shares(&urls);
        let second = compute_citation_shares(&urls);
        assert_eq!(first, second);
    }

    #[test]
    fn ties_break_alphabetically() {
        let urls = vec![
            "https://zeta.com/a".to_string(),
            "https://alpha.com/b".to_string(),
        ];
        let shares = compute_citation_shares(&urls);
        assert_eq!(shares[0].domain, "alpha.com");
        assert_eq!(shares[0].rank, 1);
        assert_eq!(shares[1].domain, "zeta.com");
        assert_eq!(shares[1].rank, 2);
    }

    #[test]
    fn thirds_round_to_two_decimals() {
        let urls = vec![
            "https://a.com/1".to_string(),
            "https://b.com/2".to_string(),
            "https://c.com/3".to_string(),
        ];
        let shares = compute_citation_shares(&urls);
        for share in &shares {
            assert_eq!(share.share_pct.to_string(), "33.33");
        }
    }

    #[test]
    fn empty_input_yields_no_shares() {
        assert!(compute_citation_shares(&[]).is_empty());
    }
}
