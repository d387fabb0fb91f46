//! Wire models for the Discourse JSON API.
//!
//! Only the fields the scraper reads are modelled. Fields Discourse may send
//! as `null` are deserialized leniently so one odd topic does not break a
//! whole listing page.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Topic-level fields that may designate the accepted answer, in precedence order.
pub const ACCEPTED_ANSWER_FIELDS: &[&str] = &["accepted_answer", "accepted_answer_post_id"];

/// One page of `/c/{slug}/{id}.json?page=N`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic_list: TopicList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<TopicSummary>,
}

/// A topic as it appears in the category listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicSummary {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub like_count: u64,
}

/// Response of `/t/{slug}/{id}.json`.
///
/// Posts are kept as raw JSON so a single malformed post can be skipped
/// without losing the rest of the stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_stream: PostStream,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostStream {
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<Value>,
}

/// Reference to the accepted answer as declared by the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedAnswer {
    /// The declared value is a post id.
    PostId(u64),
    /// The declared value is an object naming a post number within the topic.
    PostNumber(u64),
}

impl TopicDetail {
    /// Resolve the accepted answer from the first candidate field present on the topic.
    ///
    /// A present field holding `null` means the topic has no accepted answer;
    /// later candidates are not consulted.
    #[must_use]
    pub fn accepted_answer(&self) -> Option<AcceptedAnswer> {
        let value = ACCEPTED_ANSWER_FIELDS
            .iter()
            .find_map(|name| self.fields.get(*name))?;

        match value {
            Value::Null => None,
            Value::Number(n) => n.as_u64().map(AcceptedAnswer::PostId),
            Value::String(s) => s.trim().parse().ok().map(AcceptedAnswer::PostId),
            Value::Object(obj) => obj
                .get("post_number")
                .and_then(Value::as_u64)
                .map(AcceptedAnswer::PostNumber),
            _ => None,
        }
    }
}

/// A single post from a topic's post stream.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: u64,
    pub post_number: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub reply_to_post_number: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cooked: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mentioned_users: Vec<MentionedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MentionedUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
}

/// Tags arrive as plain names on older forums and as `{id, name, slug}` objects on newer ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagValue {
    Name(String),
    Object { name: String },
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags: Option<Vec<TagValue>> = Option::deserialize(deserializer)?;
    Ok(tags
        .unwrap_or_default()
        .into_iter()
        .map(|tag| match tag {
            TagValue::Name(name) | TagValue::Object { name } => name,
        })
        .collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
