//! External service connectors and the static tool declarations each one
//! advertises to the hosted model.
//!
//! Nothing in this crate implements these functions. They describe the API
//! surface of the MCP servers the agents are wired to, and they back the
//! `declared` tool source when no live server is available.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::Settings;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Connector {
    Mongodb,
    GoogleCalendar,
    Gmail,
    Instacart,
    GoogleMaps,
    Plaid,
}

impl Connector {
    pub const ALL: [Connector; 6] = [
        Connector::Mongodb,
        Connector::GoogleCalendar,
        Connector::Gmail,
        Connector::Instacart,
        Connector::GoogleMaps,
        Connector::Plaid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Connector::Mongodb => "mongodb",
            Connector::GoogleCalendar => "google-calendar",
            Connector::Gmail => "gmail",
            Connector::Instacart => "instacart",
            Connector::GoogleMaps => "google-maps",
            Connector::Plaid => "plaid",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Connector::Mongodb => "Data storage and retrieval",
            Connector::GoogleCalendar => "Calendar events and free/busy lookup",
            Connector::Gmail => "Receipt extraction from email",
            Connector::Instacart => "Grocery product search, pricing and ordering",
            Connector::GoogleMaps => "Geocoding, route optimization and traffic",
            Connector::Plaid => "Bank transaction data",
        }
    }

    /// npm package of the MCP server that fronts this connector.
    pub fn server_package(self) -> String {
        format!("@modelcontextprotocol/server-{}", self.name())
    }
}

/// One function the hosted model may call through a connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub connector: Connector,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDeclaration {
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn declaration(
    connector: Connector,
    name: &'static str,
    description: &'static str,
    properties: Value,
    required: &[&str],
) -> ToolDeclaration {
    ToolDeclaration {
        connector,
        name,
        description,
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

pub fn declarations(connector: Connector) -> Vec<ToolDeclaration> {
    use Connector::*;
    match connector {
        Mongodb => vec![
            declaration(
                Mongodb,
                "mongodb_find_one",
                "Find a single document in MongoDB collection",
                json!({
                    "collection": {"type": "string", "description": "Collection name"},
                    "filter": {"type": "object", "description": "Query filter"},
                }),
                &["collection", "filter"],
            ),
            declaration(
                Mongodb,
                "mongodb_find_many",
                "Find multiple documents in MongoDB collection",
                json!({
                    "collection": {"type": "string", "description": "Collection name"},
                    "filter": {"type": "object", "description": "Query filter"},
                    "limit": {"type": "integer", "description": "Maximum results", "default": 100},
                }),
                &["collection"],
            ),
            declaration(
                Mongodb,
                "mongodb_insert_one",
                "Insert a single document into MongoDB collection",
                json!({
                    "collection": {"type": "string", "description": "Collection name"},
                    "document": {"type": "object", "description": "Document to insert"},
                }),
                &["collection", "document"],
            ),
            declaration(
                Mongodb,
                "mongodb_update_one",
                "Update a single document in MongoDB collection",
                json!({
                    "collection": {"type": "string", "description": "Collection name"},
                    "filter": {"type": "object", "description": "Query filter"},
                    "update": {"type": "object", "description": "Update operations"},
                }),
                &["collection", "filter", "update"],
            ),
            declaration(
                Mongodb,
                "mongodb_aggregate",
                "Run aggregation pipeline on MongoDB collection",
                json!({
                    "collection": {"type": "string", "description": "Collection name"},
                    "pipeline": {"type": "array", "description": "Aggregation pipeline stages"},
                }),
                &["collection", "pipeline"],
            ),
        ],
        GoogleCalendar => vec![
            declaration(
                GoogleCalendar,
                "calendar_list_events",
                "List calendar events within a time range",
                json!({
                    "time_min": {"type": "string", "description": "Start time (ISO 8601)"},
                    "time_max": {"type": "string", "description": "End time (ISO 8601)"},
                    "max_results": {"type": "integer", "default": 50},
                }),
                &["time_min", "time_max"],
            ),
            declaration(
                GoogleCalendar,
                "calendar_create_event",
                "Create a new calendar event",
                json!({
                    "summary": {"type": "string", "description": "Event title"},
                    "description": {"type": "string", "description": "Event description"},
                    "start_time": {"type": "string", "description": "Start time (ISO 8601)"},
                    "end_time": {"type": "string", "description": "End time (ISO 8601)"},
                    "location": {"type": "string", "description": "Event location"},
                }),
                &["summary", "start_time", "end_time"],
            ),
            declaration(
                GoogleCalendar,
                "calendar_get_free_busy",
                "Get free/busy information for time range",
                json!({
                    "time_min": {"type": "string", "description": "Start time (ISO 8601)"},
                    "time_max": {"type": "string", "description": "End time (ISO 8601)"},
                }),
                &["time_min", "time_max"],
            ),
        ],
        Gmail => vec![
            declaration(
                Gmail,
                "gmail_search_messages",
                "Search Gmail messages with query",
                json!({
                    "query": {
                        "type": "string",
                        "description": "Gmail search query (e.g., 'from:instacart receipt')"
                    },
                    "max_results": {"type": "integer", "default": 20},
                    "after_date": {
                        "type": "string",
                        "description": "Search after this date (YYYY/MM/DD)"
                    },
                }),
                &["query"],
            ),
            declaration(
                Gmail,
                "gmail_get_message",
                "Get full message content including attachments",
                json!({
                    "message_id": {"type": "string", "description": "Gmail message ID"},
                }),
                &["message_id"],
            ),
            declaration(
                Gmail,
                "gmail_extract_receipt",
                "Extract structured data from receipt email/attachment",
                json!({
                    "message_id": {"type": "string", "description": "Gmail message ID with receipt"},
                }),
                &["message_id"],
            ),
        ],
        Instacart => vec![
            declaration(
                Instacart,
                "instacart_search_products",
                "Search for products at a specific store",
                json!({
                    "store_name": {"type": "string", "description": "Store name (e.g., 'Whole Foods')"},
                    "query": {"type": "string", "description": "Product search query"},
                    "limit": {"type": "integer", "default": 10},
                }),
                &["store_name", "query"],
            ),
            declaration(
                Instacart,
                "instacart_get_prices",
                "Get prices for a list of items across stores",
                json!({
                    "items": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of item names"
                    },
                    "stores": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of store names"
                    },
                }),
                &["items"],
            ),
            declaration(
                Instacart,
                "instacart_create_order",
                "Create and place an Instacart order",
                json!({
                    "store_name": {"type": "string", "description": "Store name"},
                    "items": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Items with product_id and quantity"
                    },
                    "delivery_window": {"type": "string", "description": "Delivery time window"},
                    "delivery_address": {"type": "object", "description": "Delivery address"},
                }),
                &["store_name", "items", "delivery_window"],
            ),
            declaration(
                Instacart,
                "instacart_track_order",
                "Get order status and tracking information",
                json!({
                    "order_id": {"type": "string", "description": "Instacart order ID"},
                }),
                &["order_id"],
            ),
        ],
        GoogleMaps => vec![
            declaration(
                GoogleMaps,
                "maps_geocode_address",
                "Convert address to latitude/longitude coordinates",
                json!({
                    "address": {"type": "string", "description": "Address to geocode"},
                }),
                &["address"],
            ),
            declaration(
                GoogleMaps,
                "maps_calculate_route",
                "Calculate optimal route for multiple destinations",
                json!({
                    "origin": {"type": "object", "description": "Start location {lat, lng}"},
                    "destinations": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "List of {lat, lng} destinations"
                    },
                    "optimize": {
                        "type": "boolean",
                        "default": true,
                        "description": "Optimize waypoint order"
                    },
                }),
                &["origin", "destinations"],
            ),
            declaration(
                GoogleMaps,
                "maps_get_traffic",
                "Get current traffic conditions for a route",
                json!({
                    "origin": {"type": "object", "description": "Start {lat, lng}"},
                    "destination": {"type": "object", "description": "End {lat, lng}"},
                    "departure_time": {"type": "string", "description": "Departure time (ISO 8601)"},
                }),
                &["origin", "destination"],
            ),
        ],
        Plaid => vec![
            declaration(
                Plaid,
                "plaid_get_transactions",
                "Fetch bank transactions for date range",
                json!({
                    "start_date": {"type": "string", "description": "Start date (YYYY-MM-DD)"},
                    "end_date": {"type": "string", "description": "End date (YYYY-MM-DD)"},
                    "account_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Account IDs to query"
                    },
                }),
                &["start_date", "end_date"],
            ),
            declaration(
                Plaid,
                "plaid_categorize_transaction",
                "Get category for a transaction",
                json!({
                    "transaction_id": {"type": "string", "description": "Transaction ID"},
                    "merchant_name": {"type": "string", "description": "Merchant name"},
                    "amount": {"type": "number", "description": "Transaction amount"},
                }),
                &["transaction_id"],
            ),
        ],
    }
}

pub fn all_declarations() -> Vec<ToolDeclaration> {
    Connector::ALL
        .iter()
        .flat_map(|connector| declarations(*connector))
        .collect()
}

pub fn find_declaration(name: &str) -> Option<ToolDeclaration> {
    all_declarations()
        .into_iter()
        .find(|declaration| declaration.name == name)
}

/// Checks that `args` is an object carrying every required parameter.
pub fn validate_arguments(declaration: &ToolDeclaration, args: &Value) -> Result<()> {
    let Some(object) = args.as_object() else {
        return Err(anyhow::anyhow!(
            "tool '{}' expects a JSON object of arguments",
            declaration.name
        ));
    };

    let missing = declaration
        .required()
        .into_iter()
        .filter(|name| object.get(*name).is_none_or(Value::is_null))
        .collect::<Vec<&str>>();
    if missing.is_empty() {
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "tool '{}' is missing required argument(s): {}",
        declaration.name,
        missing.join(", ")
    ))
}

/// How to start a connector's MCP server as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

pub fn launch_spec(connector: Connector, settings: &Settings) -> LaunchSpec {
    let mut args = vec!["-y".to_string(), connector.server_package()];
    // MongoDB takes its connection string positionally.
    if connector == Connector::Mongodb {
        args.push(settings.mongodb_uri.clone());
    }

    LaunchSpec {
        command: "npx".to_string(),
        args,
        env: credentials(connector, settings)
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    }
}

/// Environment variables handed to the connector's server process.
pub fn credentials(connector: Connector, settings: &Settings) -> Vec<(&'static str, String)> {
    match connector {
        Connector::Mongodb => Vec::new(),
        Connector::GoogleCalendar => vec![
            (
                "GOOGLE_CALENDAR_CLIENT_ID",
                settings.google_calendar_client_id.clone(),
            ),
            (
                "GOOGLE_CALENDAR_CLIENT_SECRET",
                settings.google_calendar_client_secret.clone(),
            ),
        ],
        Connector::Gmail => vec![
            ("GMAIL_CLIENT_ID", settings.gmail_client_id.clone()),
            ("GMAIL_CLIENT_SECRET", settings.gmail_client_secret.clone()),
        ],
        Connector::Instacart => vec![
            ("INSTACART_API_KEY", settings.instacart_api_key.clone()),
            ("INSTACART_USER_TOKEN", settings.instacart_user_token.clone()),
        ],
        Connector::GoogleMaps => vec![(
            "GOOGLE_MAPS_API_KEY",
            settings.google_maps_api_key.clone(),
        )],
        Connector::Plaid => vec![
            ("PLAID_CLIENT_ID", settings.plaid_client_id.clone()),
            ("PLAID_SECRET", settings.plaid_secret.clone()),
            ("PLAID_ENV", settings.plaid_env.as_str().to_string()),
        ],
    }
}

pub fn run_tools_list(connector: Option<Connector>, schema: bool) -> Result<()> {
    let connectors = match connector {
        Some(connector) => vec![connector],
        None => Connector::ALL.to_vec(),
    };

    for connector in connectors {
        println!("{} ({}):", connector.name(), connector.description());
        for declaration in declarations(connector) {
            println!(
                "- {}({}) {}",
                declaration.name,
                declaration.required().join(", "),
                declaration.description
            );
            if schema {
                let rendered = serde_json::to_string_pretty(&declaration.parameters)
                    .unwrap_or_else(|_| Value::Object(Map::new()).to_string());
                for line in rendered.lines() {
                    println!("    {line}");
                }
            }
        }
    }
    Ok(())
}
