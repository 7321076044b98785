//! `get_order_status`: look up an order in the mock order table.

use helpdesk_rs::tools::core::{Tool, ToolArgs, ToolFuture, parse_tool_args};
use helpdesk_rs::tools::declaration::{ParamType, ToolDeclaration};
use helpdesk_rs::tools::result::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

const NOT_FOUND_STATUS: &str = "Bulunamadı";
const NOT_FOUND_MESSAGE: &str = "Bu sipariş numarası sistemde bulunamadı.";

/// One row of the order table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrderRecord {
    pub status: &'static str,
    pub estimated_delivery: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<&'static str>,
}

const ORDERS: &[(&str, OrderRecord)] = &[
    (
        "123456",
        OrderRecord {
            status: "Hazırlanıyor",
            estimated_delivery: "2023-03-25",
            tracking_number: None,
        },
    ),
    (
        "867530",
        OrderRecord {
            status: "Kargoya Verildi",
            estimated_delivery: "2023-03-22",
            tracking_number: Some("TR123456789"),
        },
    ),
];

/// Find an order by id. Surrounding whitespace is ignored.
pub fn find_order(order_id: &str) -> Option<&'static OrderRecord> {
    let id = order_id.trim();
    ORDERS.iter().find(|(k, _)| *k == id).map(|(_, r)| r)
}

#[derive(Deserialize)]
struct OrderArgs {
    order_id: String,
}

/// Order status lookup.
pub struct OrderStatus {
    decl: ToolDeclaration,
}

impl OrderStatus {
    pub fn new() -> Self {
        Self {
            decl: ToolDeclaration::builder(super::GET_ORDER_STATUS)
                .description(
                    "Verilen sipariş numarası için sipariş durumunu sorgular. \
                     Kullanıcı bir siparişin nerede olduğunu veya ne zaman \
                     geleceğini sorduğunda kullan.",
                )
                .required(
                    "order_id",
                    ParamType::String,
                    "Sorgulanacak sipariş numarası, örn. \"123456\"",
                )
                .build(),
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for OrderStatus {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    /// Models often send the order number as a JSON number.
    fn normalize(&self, args: &mut ToolArgs) {
        if let Some(Value::Number(n)) = args.get("order_id") {
            let id = n.to_string();
            args.insert("order_id".into(), Value::String(id));
        }
    }

    fn execute(&self, args: ToolArgs) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: OrderArgs = match parse_tool_args(&args) {
                Ok(a) => a,
                Err(e) => return e,
            };
            let order_id = args.order_id.trim();

            let result = match find_order(order_id) {
                Some(record) => {
                    let mut payload = json!({ "order_id": order_id });
                    if let (Some(obj), Ok(Value::Object(fields))) =
                        (payload.as_object_mut(), serde_json::to_value(record))
                    {
                        obj.extend(fields);
                    }
                    ToolResult::ok(payload)
                }
                None => ToolResult::not_found(NOT_FOUND_MESSAGE).with_payload(json!({
                    "order_id": order_id,
                    "status": NOT_FOUND_STATUS,
                })),
            };
            info!("get_order_status({order_id}) -> success={}", result.success);
            result
        })
    }
}
