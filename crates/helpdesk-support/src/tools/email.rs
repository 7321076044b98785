//! `update_user_email`: mock account e-mail change.

use helpdesk_rs::tools::core::{Tool, ToolArgs, ToolFuture, parse_tool_args};
use helpdesk_rs::tools::declaration::{ParamType, ToolDeclaration};
use helpdesk_rs::tools::result::ToolResult;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const INVALID_MESSAGE: &str = "Geçerli bir e-posta adresi girilmelidir.";

/// The address must contain both `@` and `.`.
pub fn is_plausible_email(address: &str) -> bool {
    address.contains('@') && address.contains('.')
}

#[derive(Deserialize)]
struct EmailArgs {
    new_email: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// E-mail update.
pub struct UpdateEmail {
    decl: ToolDeclaration,
}

impl UpdateEmail {
    pub fn new() -> Self {
        Self {
            decl: ToolDeclaration::builder(super::UPDATE_USER_EMAIL)
                .description(
                    "Kullanıcının e-posta adresini günceller. Kullanıcı yeni bir \
                     e-posta adresi verdiğinde kullan.",
                )
                .required("new_email", ParamType::String, "Yeni e-posta adresi")
                .optional("user_id", ParamType::String, "Kullanıcı numarası, biliniyorsa")
                .build(),
        }
    }
}

impl Default for UpdateEmail {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for UpdateEmail {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    fn execute(&self, args: ToolArgs) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: EmailArgs = match parse_tool_args(&args) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let new_email = args.new_email.trim();

            if !is_plausible_email(new_email) {
                info!("update_user_email rejected {new_email:?}");
                return ToolResult::validation(INVALID_MESSAGE)
                    .with_payload(json!({ "new_email": new_email }));
            }

            let mut payload = json!({ "new_email": new_email });
            if let Some(user_id) = args.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
                payload["user_id"] = json!(user_id);
            }
            info!("update_user_email -> {new_email}");
            ToolResult::ok(payload)
                .with_message(format!("E-posta adresiniz {new_email} olarak güncellenmiştir."))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_rs::tools::core::ToolSet;
    use helpdesk_rs::tools::result::ToolErrorKind;

    fn tools() -> ToolSet {
        ToolSet::new().with(UpdateEmail::new())
    }

    #[tokio::test]
    async fn valid_address_is_accepted() {
        let result = tools()
            .invoke("update_user_email", json!({"new_email": "ayse@example.com"}))
            .await;
        assert!(result.success);
        assert_eq!(result.field("new_email"), Some(&json!("ayse@example.com")));
        assert!(result.field("user_id").is_none());
        assert_eq!(
            result.message.as_deref(),
            Some("E-posta adresiniz ayse@example.com olarak güncellenmiştir.")
        );
    }

    #[tokio::test]
    async fn user_id_is_echoed() {
        let result = tools()
            .invoke(
                "update_user_email",
                json!({"new_email": "a@b.co", "user_id": "U-17"}),
            )
            .await;
        assert!(result.success);
        assert_eq!(result.field("user_id"), Some(&json!("U-17")));
    }

    #[tokio::test]
    async fn implausible_address_is_rejected() {
        for bad in ["ayse.example.com", "ayse@example", ""] {
            let result = tools()
                .invoke("update_user_email", json!({"new_email": bad}))
                .await;
            assert!(!result.success, "{bad:?} should be rejected");
            assert_eq!(result.error, Some(ToolErrorKind::Validation));
            assert_eq!(result.message.as_deref(), Some(INVALID_MESSAGE));
        }
    }

    #[tokio::test]
    async fn wrong_type_fails_schema() {
        let result = tools()
            .invoke("update_user_email", json!({"new_email": 42}))
            .await;
        assert_eq!(result.error, Some(ToolErrorKind::Validation));
        assert!(result.message.unwrap().contains("new_email"));
    }
}
