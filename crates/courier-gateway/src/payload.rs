//! Outbound message payloads, serialized to the gateway's wire shape:
//! `{messaging_product, to, type?, text?|template?}`.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OutboundMessage {
    messaging_product: &'static str,
    to: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<TemplateBody>,
}

#[derive(Debug, Serialize)]
struct TextBody {
    body: String,
}

#[derive(Debug, Serialize)]
struct TemplateBody {
    name: String,
    language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<Component>>,
}

#[derive(Debug, Serialize)]
struct Language {
    code: String,
}

#[derive(Debug, Serialize)]
struct Component {
    #[serde(rename = "type")]
    kind: &'static str,
    parameters: Vec<Parameter>,
}

#[derive(Debug, Serialize)]
struct Parameter {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl OutboundMessage {
    /// Free-text message. The wire shape carries no `type` field.
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: to.into(),
            kind: None,
            text: Some(TextBody { body: body.into() }),
            template: None,
        }
    }

    /// Template-only message (no substitution placeholder). The
    /// template name is lower-cased to match the gateway's registry.
    pub fn template(
        to: impl Into<String>,
        name: &str,
        language_code: impl Into<String>,
    ) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: to.into(),
            kind: Some("template"),
            text: None,
            template: Some(TemplateBody {
                name: name.to_lowercase(),
                language: Language {
                    code: language_code.into(),
                },
                components: None,
            }),
        }
    }

    /// Attach a single body-parameter component carrying the
    /// personalized text. Only meaningful on template messages.
    pub fn with_body_parameter(mut self, text: impl Into<String>) -> Self {
        if let Some(template) = self.template.as_mut() {
            template.components = Some(vec![Component {
                kind: "body",
                parameters: vec![Parameter {
                    kind: "text",
                    text: text.into(),
                }],
            }]);
        }
        self
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn text_payload_shape() {
        let value = to_value(OutboundMessage::text("50761111111", "hola")).unwrap();
        assert_eq!(
            value,
            json!({
                "messaging_product": "whatsapp",
                "to": "50761111111",
                "text": { "body": "hola" }
            })
        );
    }

    #[test]
    fn template_only_payload_has_no_components() {
        let value = to_value(OutboundMessage::template("50761111111", "hello_world", "en_US"))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "messaging_product": "whatsapp",
                "to": "50761111111",
                "type": "template",
                "template": {
                    "name": "hello_world",
                    "language": { "code": "en_US" }
                }
            })
        );
    }

    #[test]
    fn template_name_is_lowercased() {
        let value = to_value(OutboundMessage::template("507", "Hello_World", "en_US")).unwrap();
        assert_eq!(value["template"]["name"], "hello_world");
    }

    #[test]
    fn body_parameter_attaches_one_component() {
        let message = OutboundMessage::template("507", "inicio_de_conversacion", "es_PAN")
            .with_body_parameter("Hola Ana");
        let value = to_value(message).unwrap();

        let components = value["template"]["components"].as_array().unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0]["type"], "body");
        assert_eq!(
            components[0]["parameters"],
            json!([{ "type": "text", "text": "Hola Ana" }])
        );
    }

    #[test]
    fn body_parameter_on_text_is_a_no_op() {
        let value = to_value(OutboundMessage::text("507", "hola").with_body_parameter("Ana"))
            .unwrap();
        assert!(value.get("template").is_none());
        assert!(value.get("components").is_none());
    }
}
