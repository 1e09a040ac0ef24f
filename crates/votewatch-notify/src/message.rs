use votewatch_core::ProposalId;
use votewatch_core::config::NotifyConfig;

/// Subject and plain-text body of a proposal notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

impl EmailContent {
    pub fn render(config: &NotifyConfig, id: &ProposalId) -> Self {
        let link = format!("{}/{id}", config.dashboard_url.trim_end_matches('/'));
        Self {
            subject: format!("{} Proposal requires your vote - {id}", config.subject_prefix),
            body: format!(
                "Hi,\n\n\
                 Proposal {id} requires your vote.\n\
                 Please see all details here: {link}\n\n\
                 Regards,\n\
                 {}",
                config.signature
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_content() {
        let email = EmailContent::render(&NotifyConfig::default(), &"134123".into());
        assert_eq!(
            email.subject,
            "[ICP HUB] Proposal requires your vote - 134123"
        );
        assert_eq!(
            email.body,
            "Hi,\n\nProposal 134123 requires your vote.\n\
             Please see all details here: https://dashboard.internetcomputer.org/proposal/134123\n\n\
             Regards,\nICP HUB Bot"
        );
    }

    #[test]
    fn dashboard_trailing_slash_ignored() {
        let config = NotifyConfig {
            dashboard_url: "https://example.org/p/".into(),
            ..NotifyConfig::default()
        };
        let email = EmailContent::render(&config, &"7".into());
        assert!(email.body.contains("https://example.org/p/7\n"));
    }
}
