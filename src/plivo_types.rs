pub fn wrap_xml(xml: String) -> String {
    format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>{xml}")
}

mod markup {
    use xmlserde::xml_serde_enum;
    use xmlserde_derives::XmlSerialize;

    #[derive(PartialEq, Eq, XmlSerialize)]
    #[xmlserde(root = b"Response")]
    pub struct Response {
        #[xmlserde(ty = "untag")]
        pub actions: Vec<ResponseAction>,
    }

    #[derive(PartialEq, Eq, XmlSerialize)]
    pub enum ResponseAction {
        #[xmlserde(name = b"Speak")]
        Speak(SpeakAction),
        #[xmlserde(name = b"Play")]
        Play(PlayAction),
        #[xmlserde(name = b"Conference")]
        Conference(ConferenceAction),
    }

    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct SpeakAction {
        #[xmlserde(ty = "text")]
        pub text: String,
        #[xmlserde(name = b"voice", ty = "attr")]
        pub voice: Option<Voice>,
        #[xmlserde(name = b"language", ty = "attr")]
        pub language: Option<String>,
        #[xmlserde(name = b"loop", ty = "attr")]
        pub lp: Option<u16>,
    }

    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct PlayAction {
        #[xmlserde(ty = "text")]
        pub url: String,
        #[xmlserde(name = b"loop", ty = "attr")]
        pub lp: Option<u16>,
    }

    /// Places the call into the named conference room.
    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct ConferenceAction {
        #[xmlserde(ty = "text")]
        pub room: String,
        #[xmlserde(name = b"maxMembers", ty = "attr")]
        pub max_members: Option<u16>,
        #[xmlserde(name = b"enterSound", ty = "attr")]
        pub enter_sound: Option<String>,
        #[xmlserde(name = b"waitSound", ty = "attr")]
        pub wait_sound: Option<String>,
        /// Seconds
        #[xmlserde(name = b"timeLimit", ty = "attr")]
        pub time_limit: Option<u32>,
        #[xmlserde(name = b"floorEvent", ty = "attr")]
        pub floor_event: Option<Flag>,
        #[xmlserde(name = b"action", ty = "attr")]
        pub action: Option<String>,
        #[xmlserde(name = b"method", ty = "attr")]
        pub method: Option<HttpMethod>,
        #[xmlserde(name = b"callbackUrl", ty = "attr")]
        pub callback_url: Option<String>,
        #[xmlserde(name = b"callbackMethod", ty = "attr")]
        pub callback_method: Option<HttpMethod>,
    }

    xml_serde_enum! {
        #[derive(PartialEq, Eq, Debug)]
        Voice {
            Woman => "WOMAN",
            Man => "MAN",
        }
    }

    xml_serde_enum! {
        #[derive(PartialEq, Eq, Debug)]
        HttpMethod {
            Get => "GET",
            Post => "POST",
        }
    }

    xml_serde_enum! {
        #[derive(PartialEq, Eq, Debug)]
        Flag {
            True => "true",
            False => "false",
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::plivo_types::wrap_xml;

        #[test]
        fn play_document() {
            let response = Response {
                actions: vec![ResponseAction::Play(PlayAction {
                    url: "http://music.example.com/hold.mp3".to_string(),
                    lp: Some(50),
                })],
            };
            let xml = wrap_xml(xmlserde::xml_serialize(response));
            assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?><Response>"));
            assert!(xml.contains("<Play loop=\"50\">http://music.example.com/hold.mp3</Play>"));
            assert!(xml.ends_with("</Response>"));
        }

        #[test]
        fn conference_document_keeps_action_order() {
            let response = Response {
                actions: vec![
                    ResponseAction::Speak(SpeakAction {
                        text: "Hello".to_string(),
                        voice: Some(Voice::Woman),
                        ..Default::default()
                    }),
                    ResponseAction::Conference(ConferenceAction {
                        room: "room-1".to_string(),
                        max_members: Some(15),
                        time_limit: Some(8400),
                        floor_event: Some(Flag::True),
                        callback_method: Some(HttpMethod::Get),
                        ..Default::default()
                    }),
                ],
            };
            let xml = xmlserde::xml_serialize(response);
            let speak = xml.find("<Speak voice=\"WOMAN\">Hello</Speak>").unwrap();
            let conference = xml.find("<Conference ").unwrap();
            assert!(speak < conference);
            assert!(xml.contains("maxMembers=\"15\""));
            assert!(xml.contains("timeLimit=\"8400\""));
            assert!(xml.contains("floorEvent=\"true\""));
            assert!(xml.contains("callbackMethod=\"GET\""));
            assert!(xml.contains(">room-1</Conference>"));
            assert!(!xml.contains("waitSound"));
        }
    }
}
pub use markup::*;

mod rest {
    use serde::{Deserialize, Deserializer, Serialize};
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum Method {
        Get,
        Post,
    }

    /// Body of an outbound call request.
    #[derive(Serialize, Debug)]
    pub struct CallRequest {
        pub to: String,
        pub from: String,
        pub answer_url: String,
        pub answer_method: Method,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub ring_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub ring_method: Option<Method>,
    }

    #[derive(Serialize, Debug)]
    pub struct SpeakRequest {
        pub text: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct LiveConference {
        #[serde(default)]
        pub members: Vec<Member>,
    }

    /// A participant of a live conference, as reported by Plivo.
    #[derive(Deserialize, Debug, Clone)]
    pub struct Member {
        #[serde(deserialize_with = "string_or_number")]
        pub member_id: String,
        pub to: String,
        #[serde(flatten)]
        pub extra: HashMap<String, serde_json::Value>,
    }

    fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Id {
            Text(String),
            Number(u64),
        }
        Ok(match Id::deserialize(deserializer)? {
            Id::Text(s) => s,
            Id::Number(n) => n.to_string(),
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn live_conference_members() {
            let body = r#"{
                "conference_name": "collaborate-io",
                "conference_member_count": "2",
                "members": [
                    {"member_id": "17", "to": "15551234", "from": "15550001111", "muted": false},
                    {"member_id": 18, "to": "sip:alice@example.com", "from": "15550001111"}
                ]
            }"#;
            let conference: LiveConference = serde_json::from_str(body).unwrap();
            let ids: Vec<&str> = conference.members.iter().map(|m| m.member_id.as_str()).collect();
            assert_eq!(ids, vec!["17", "18"]);
            assert_eq!(conference.members[0].to, "15551234");
            assert_eq!(conference.members[0].extra["muted"], serde_json::json!(false));
        }

        #[test]
        fn call_request_skips_missing_ring_url() {
            let request = CallRequest {
                to: "15551234".to_string(),
                from: "15550001111".to_string(),
                answer_url: "https://example.com/response/conf/".to_string(),
                answer_method: Method::Get,
                ring_url: None,
                ring_method: None,
            };
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["answer_method"], "GET");
            assert!(json.get("ring_url").is_none());
        }
    }
}
pub use rest::*;

mod webhook {
    use serde::Deserialize;

    /// Sent when an outbound call starts ringing.
    #[derive(Deserialize, Debug)]
    pub struct RingPayload {
        #[serde(rename = "CallUUID")]
        pub call_uuid: Option<String>,
        #[serde(rename = "To")]
        pub to: Option<String>,
    }

    /// Sent to the conference `callbackUrl` on member and floor changes.
    #[derive(Deserialize, Debug)]
    pub struct ConferenceCallbackPayload {
        #[serde(rename = "Event")]
        pub event: Option<String>,
        #[serde(rename = "ConferenceAction")]
        pub conference_action: Option<String>,
        #[serde(rename = "ConferenceMemberID")]
        pub member_id: Option<String>,
    }
}
pub use webhook::*;
