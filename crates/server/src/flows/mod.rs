//! Challenge flow orchestration.
//!
//! Each flow has two entry points: `begin_*` reads the challenge and either
//! decides on its own or asks for a prompt, `submit_*` resumes after the user
//! answered that prompt. The challenge id is the only state carried between
//! the two; nothing is kept in process.

pub mod consent;
pub mod consent_resolver;
pub mod login;
pub mod logout;

use std::sync::Arc;

use crate::challenge::{ChallengeGateway, Redirect};
use crate::config::AppConfig;
use crate::identity::{CredentialVerifier, UserDirectory};

pub use consent::{ConsentFlow, ConsentPrompt, ConsentSettings, ConsentSubmission, PromptEntry};
pub use consent_resolver::{ConsentResolver, ResolvedConsent, roles_for_client};
pub use login::{LoginFlow, LoginPrompt, LoginSettings};
pub use logout::{LogoutFlow, LogoutPrompt};

/// Result of a flow step: either a page must be shown or the user agent moves on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowOutcome<P> {
    Prompt(P),
    Redirect(Redirect),
}

impl<P> FlowOutcome<P> {
    pub fn is_prompt(&self) -> bool {
        matches!(self, FlowOutcome::Prompt(_))
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            FlowOutcome::Redirect(redirect) => Some(redirect),
            FlowOutcome::Prompt(_) => None,
        }
    }
}

/// All three flows, built once at startup from the injected collaborators.
#[derive(Clone)]
pub struct Flows {
    pub login: LoginFlow,
    pub consent: ConsentFlow,
    pub logout: LogoutFlow,
}

impl Flows {
    pub fn new(
        gateway: Arc<dyn ChallengeGateway>,
        verifier: Arc<dyn CredentialVerifier>,
        users: Arc<dyn UserDirectory>,
        config: &AppConfig,
    ) -> Self {
        let resolver = ConsentResolver::new(users);
        Self {
            login: LoginFlow::new(gateway.clone(), verifier, LoginSettings::from(&config.login)),
            consent: ConsentFlow::new(
                gateway.clone(),
                resolver,
                ConsentSettings::from(&config.consent),
            ),
            logout: LogoutFlow::new(gateway),
        }
    }
}
