//! Telephony markup rendering for [`ResponseEnvelope`]s.

use std::sync::Arc;

use receptionist_core::errors::ApplicationError;
use receptionist_core::prompts;
use receptionist_core::turn::{EnvelopeSettings, ResponseEnvelope};
use tera::{Context, Tera};

pub const RESPONSE_TEMPLATE: &str = "voice/response.xml";

pub fn init_templates() -> Result<Arc<Tera>, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(
        RESPONSE_TEMPLATE,
        include_str!("../../../templates/voice/response.xml"),
    )?;
    tera.autoescape_on(vec![".xml"]);
    tera.set_escape_fn(escape_xml);
    Ok(Arc::new(tera))
}

pub fn render(templates: &Tera, envelope: &ResponseEnvelope) -> Result<String, ApplicationError> {
    let context = Context::from_serialize(envelope)
        .map_err(|error| ApplicationError::Rendering(error.to_string()))?;
    templates
        .render(RESPONSE_TEMPLATE, &context)
        .map_err(|error| ApplicationError::Rendering(error.to_string()))
}

/// Spoken when the envelope cannot be rendered, so the caller still hears a
/// response before the call ends.
pub fn fallback_document(settings: &EnvelopeSettings) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n  <Say voice=\"{}\">{}</Say>\n  \
         <Hangup/>\n</Response>\n",
        escape_xml(&settings.voice),
        escape_xml(prompts::RECEPTION_TRANSFER)
    )
}

pub fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use receptionist_core::dialog::{Action, DialogEngine, DialogState, Disposition};
    use receptionist_core::intent::Intent;
    use receptionist_core::turn::{render_action, EnvelopeSettings};
    use tera::Tera;

    use super::{escape_xml, fallback_document, init_templates, render};

    #[test]
    fn greeting_renders_say_then_gather() {
        let templates = init_templates().expect("templates");
        let envelope = render_action(
            &DialogEngine::default().on_silence(DialogState::Start),
            &EnvelopeSettings::default(),
        );
        let xml = render(&templates, &envelope).expect("render");

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Say voice=\"Polly.Joanna\">"));
        assert!(xml.contains(
            "<Gather input=\"speech\" timeout=\"5\" speechTimeout=\"auto\" action=\"/voice\""
        ));
        assert!(!xml.contains("<Hangup/>"));
        assert!(xml.trim_end().ends_with("</Response>"));
    }

    #[test]
    fn claims_offer_carries_context_in_action_url() {
        let templates = init_templates().expect("templates");
        let engine = DialogEngine::default();
        let action = engine.next_action(Intent::Claims, "claim", DialogState::Start);
        let xml = render(&templates, &render_action(&action, &EnvelopeSettings::default()))
            .expect("render");

        assert!(xml.contains("action=\"/voice?context=claims_offered\""));
    }

    #[test]
    fn terminate_renders_pause_then_hangup() {
        let templates = init_templates().expect("templates");
        let action = Action::Terminate {
            text: "Connecting you & your <claim> now.".to_string(),
            disposition: Disposition::ClaimsTransfer,
        };
        let xml = render(&templates, &render_action(&action, &EnvelopeSettings::default()))
            .expect("render");

        assert!(xml.contains("Connecting you &amp; your &lt;claim&gt; now."));
        let pause = xml.find("<Pause length=\"1\"/>").expect("pause");
        let hangup = xml.find("<Hangup/>").expect("hangup");
        assert!(pause < hangup);
    }

    #[test]
    fn missing_template_is_a_rendering_error() {
        let envelope = render_action(
            &DialogEngine::default().on_silence(DialogState::Start),
            &EnvelopeSettings::default(),
        );
        let error = render(&Tera::default(), &envelope).expect_err("no template registered");

        assert!(error.to_string().contains("response rendering failure"));
    }

    #[test]
    fn fallback_document_speaks_and_hangs_up() {
        let xml = fallback_document(&EnvelopeSettings::default());

        assert!(xml.contains("<Say voice=\"Polly.Joanna\">"));
        assert!(xml.contains("<Hangup/>"));
        assert!(!xml.contains("<Gather"));
    }

    #[test]
    fn xml_escape_covers_markup_characters() {
        assert_eq!(escape_xml("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&apos;");
        assert_eq!(escape_xml("plain text"), "plain text");
    }
}
