use graphql_parser::query as q;
use serde::de::Deserializer;
use serde_derive::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::Deref;

/// A parsed GraphQL document that owns its strings.
pub type Document = q::Document<'static, String>;

/// Converts a JSON variable value into a GraphQL input value.
///
/// Integers that fit into 32 bits become `Int`, everything else numeric
/// becomes `Float` so that coercion can reject it with a proper message.
fn json_to_graphql(value: serde_json::Value) -> q::Value<'static, String> {
    match value {
        serde_json::Value::Null => q::Value::Null,
        serde_json::Value::Bool(b) => q::Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64().map(i32::try_from) {
            Some(Ok(i)) => q::Value::Int(q::Number::from(i)),
            _ => q::Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => q::Value::String(s),
        serde_json::Value::Array(values) => {
            q::Value::List(values.into_iter().map(json_to_graphql).collect())
        }
        serde_json::Value::Object(map) => q::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, json_to_graphql(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

fn deserialize_variables<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, q::Value<'static, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let pairs: HashMap<String, serde_json::Value> = serde::Deserialize::deserialize(deserializer)?;
    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k, json_to_graphql(v)))
        .collect())
}

/// Variable values for a GraphQL query.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct QueryVariables(
    #[serde(deserialize_with = "deserialize_variables")] HashMap<String, q::Value<'static, String>>,
);

impl QueryVariables {
    pub fn new(variables: HashMap<String, q::Value<'static, String>>) -> Self {
        QueryVariables(variables)
    }
}

impl Deref for QueryVariables {
    type Target = HashMap<String, q::Value<'static, String>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Per-request data handed through to resolvers untouched, such as the
/// HTTP headers of the request. Header names are stored lowercased.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
    headers: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        RequestContext {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A GraphQL operation request as submitted by a client.
#[derive(Clone, Debug)]
pub struct Query {
    pub document: Document,
    pub variables: Option<QueryVariables>,
    pub operation_name: Option<String>,
    pub context: RequestContext,
}

impl Query {
    pub fn new(document: Document, variables: Option<QueryVariables>) -> Self {
        Query {
            document,
            variables,
            operation_name: None,
            context: RequestContext::default(),
        }
    }

    pub fn with_operation_name(mut self, name: Option<String>) -> Self {
        self.operation_name = name;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}
