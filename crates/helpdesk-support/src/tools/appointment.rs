//! `schedule_appointment`: book a service appointment.
//!
//! Relative dates are resolved in [`Tool::normalize`], so the agent trace
//! shows the concrete `YYYY-MM-DD` date that was booked rather than the
//! word the user typed.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use helpdesk_rs::clock::{Clock, format_date};
use helpdesk_rs::tools::core::{Tool, ToolArgs, ToolFuture, parse_tool_args};
use helpdesk_rs::tools::declaration::{ParamType, ToolDeclaration};
use helpdesk_rs::tools::result::ToolResult;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::fold_text;

pub const DEFAULT_SERVICE_TYPE: &str = "Genel Servis";
pub const DEFAULT_TIME: &str = "09:00";

const TOMORROW_WORDS: &[&str] = &["yarin", "tomorrow"];
const TODAY_WORDS: &[&str] = &["bugun", "today"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H.%M", "%H:%M:%S"];

/// Resolve the `preferred_date` argument against `clock`.
///
/// Missing values and the words for tomorrow give tomorrow, the words for
/// today give today, anything unparsable falls back to tomorrow.
pub fn resolve_date(value: Option<&Value>, clock: &dyn Clock) -> NaiveDate {
    let Some(raw) = value else {
        return clock.tomorrow();
    };
    let Some(text) = raw.as_str().map(str::trim).filter(|t| !t.is_empty()) else {
        if !raw.is_null() {
            warn!("Invalid preferred_date {raw}, using tomorrow");
        }
        return clock.tomorrow();
    };

    let folded = fold_text(text);
    if TOMORROW_WORDS.contains(&folded.as_str()) {
        return clock.tomorrow();
    }
    if TODAY_WORDS.contains(&folded.as_str()) {
        return clock.today();
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
    {
        return date;
    }

    warn!("Invalid date format {text:?}, using tomorrow");
    clock.tomorrow()
}

/// Resolve `preferred_time` to `HH:MM`, falling back to [`DEFAULT_TIME`].
pub fn resolve_time(value: Option<&Value>) -> String {
    let text = value.and_then(Value::as_str).map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return DEFAULT_TIME.to_string();
    }
    match TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(text, f).ok())
    {
        Some(time) => time.format("%H:%M").to_string(),
        None => {
            warn!("Invalid time format {text:?}, using {DEFAULT_TIME}");
            DEFAULT_TIME.to_string()
        }
    }
}

#[derive(Deserialize)]
struct AppointmentArgs {
    service_type: String,
    preferred_date: String,
    preferred_time: String,
}

/// Appointment booking. Reads the date and the booking id from `clock`.
pub struct ScheduleAppointment {
    decl: ToolDeclaration,
    clock: Arc<dyn Clock>,
}

impl ScheduleAppointment {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            decl: ToolDeclaration::builder(super::SCHEDULE_APPOINTMENT)
                .description(
                    "Servis randevusu oluşturur. Kullanıcı bakım, onarım veya \
                     kurulum için randevu istediğinde kullan.",
                )
                .with_default(
                    "service_type",
                    ParamType::String,
                    DEFAULT_SERVICE_TYPE,
                    "Randevu türü; belirtilmezse genel servis",
                )
                .optional(
                    "preferred_date",
                    ParamType::String,
                    "Tercih edilen tarih (YYYY-AA-GG); \"yarın\" da kabul edilir",
                )
                .with_default(
                    "preferred_time",
                    ParamType::String,
                    DEFAULT_TIME,
                    "Tercih edilen saat (SS:DD)",
                )
                .build(),
            clock,
        }
    }
}

impl Tool for ScheduleAppointment {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    fn normalize(&self, args: &mut ToolArgs) {
        let date = resolve_date(args.get("preferred_date"), self.clock.as_ref());
        args.insert("preferred_date".into(), Value::String(format_date(date)));

        let time = resolve_time(args.get("preferred_time"));
        args.insert("preferred_time".into(), Value::String(time));

        let blank_service = args
            .get("service_type")
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().is_empty());
        if blank_service {
            args.insert("service_type".into(), json!(DEFAULT_SERVICE_TYPE));
        }
    }

    fn execute(&self, args: ToolArgs) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: AppointmentArgs = match parse_tool_args(&args) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let appointment_id = self.clock.now().format("APT%Y%m%d%H%M%S").to_string();
            let service_type = args.service_type.trim();
            info!(
                "schedule_appointment {appointment_id}: {service_type} on {} at {}",
                args.preferred_date, args.preferred_time
            );

            ToolResult::ok(json!({
                "appointment_id": appointment_id,
                "service_type": service_type,
                "date": args.preferred_date,
                "time": args.preferred_time,
            }))
            .with_message(format!(
                "{} tarihinde saat {} için {service_type} randevunuz oluşturulmuştur.",
                args.preferred_date, args.preferred_time
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_rs::clock::FixedClock;
    use helpdesk_rs::tools::core::ToolSet;

    fn clock() -> FixedClock {
        FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
    }

    fn tools() -> ToolSet {
        ToolSet::new().with(ScheduleAppointment::new(Arc::new(clock())))
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn relative_words() {
        let c = clock();
        for word in ["yarın", "Yarın", "YARIN", "yarin", "Tomorrow"] {
            assert_eq!(
                format_date(resolve_date(Some(&json!(word)), &c)),
                "2024-03-21",
                "{word}"
            );
        }
        for word in ["bugün", "BUGÜN", "today"] {
            assert_eq!(format_date(resolve_date(Some(&json!(word)), &c)), "2024-03-20");
        }
    }

    #[test]
    fn explicit_and_invalid_dates() {
        let c = clock();
        assert_eq!(
            format_date(resolve_date(Some(&json!("2024-04-02")), &c)),
            "2024-04-02"
        );
        assert_eq!(
            format_date(resolve_date(Some(&json!("02.04.2024")), &c)),
            "2024-04-02"
        );
        assert_eq!(format_date(resolve_date(None, &c)), "2024-03-21");
        assert_eq!(format_date(resolve_date(Some(&json!("")), &c)), "2024-03-21");
        assert_eq!(
            format_date(resolve_date(Some(&json!("next week")), &c)),
            "2024-03-21"
        );
        assert_eq!(format_date(resolve_date(Some(&json!(5)), &c)), "2024-03-21");
    }

    #[test]
    fn times() {
        assert_eq!(resolve_time(Some(&json!("14:00"))), "14:00");
        assert_eq!(resolve_time(Some(&json!("9:30"))), "09:30");
        assert_eq!(resolve_time(Some(&json!("14.15"))), "14:15");
        assert_eq!(resolve_time(Some(&json!("öğleden sonra"))), "09:00");
        assert_eq!(resolve_time(Some(&json!("25:00"))), "09:00");
        assert_eq!(resolve_time(None), "09:00");
    }

    #[tokio::test]
    async fn tomorrow_at_two() {
        let (resolved, result) = tools()
            .dispatch(
                "schedule_appointment",
                args(json!({"preferred_date": "yarın", "preferred_time": "14:00"})),
            )
            .await;
        assert_eq!(resolved.get("preferred_date"), Some(&json!("2024-03-21")));
        assert_eq!(resolved.get("preferred_time"), Some(&json!("14:00")));
        assert!(result.success);
        assert_eq!(result.field("date"), Some(&json!("2024-03-21")));
        assert_eq!(result.field("time"), Some(&json!("14:00")));
        assert_eq!(result.field("service_type"), Some(&json!("Genel Servis")));
        assert_eq!(
            result.field("appointment_id"),
            Some(&json!("APT20240320103000"))
        );
        assert_eq!(
            result.message.as_deref(),
            Some("2024-03-21 tarihinde saat 14:00 için Genel Servis randevunuz oluşturulmuştur.")
        );
    }

    #[tokio::test]
    async fn no_arguments_uses_defaults() {
        let (resolved, result) = tools()
            .dispatch("schedule_appointment", ToolArgs::new())
            .await;
        assert!(result.success);
        assert_eq!(resolved.get("preferred_date"), Some(&json!("2024-03-21")));
        assert_eq!(resolved.get("preferred_time"), Some(&json!("09:00")));
        assert_eq!(resolved.get("service_type"), Some(&json!("Genel Servis")));
    }

    #[tokio::test]
    async fn null_and_blank_values_are_defaults() {
        let (resolved, result) = tools()
            .dispatch(
                "schedule_appointment",
                args(json!({"service_type": "  ", "preferred_date": null, "preferred_time": null})),
            )
            .await;
        assert!(result.success);
        assert_eq!(resolved.get("service_type"), Some(&json!("Genel Servis")));
        assert_eq!(resolved.get("preferred_date"), Some(&json!("2024-03-21")));
        assert_eq!(resolved.get("preferred_time"), Some(&json!("09:00")));
    }
}
