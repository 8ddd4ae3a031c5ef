use serde::{Deserialize, Serialize};

use crate::record::InviteRecord;

/// Public projection of an invite. Audit timestamps are not exposed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteView {
    pub people: Vec<String>,
    pub additional_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<Vec<String>>,
    pub is_accepted: bool,
    pub is_opened: bool,
}

impl From<&InviteRecord> for InviteView {
    fn from(r: &InviteRecord) -> Self {
        Self {
            people: r.people.clone(),
            additional_count: r.additional_count,
            additional: (!r.additional.is_empty()).then(|| r.additional.clone()),
            is_accepted: r.accepted,
            is_opened: r.is_opened(),
        }
    }
}

/// Public accept request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteUpdate {
    #[serde(alias = "accepted")]
    pub is_accepted: bool,
    #[serde(default)]
    pub additional: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn view_omits_empty_additional() {
        let r = InviteRecord::new(vec!["Иван".into()], 2);
        let json = serde_json::to_value(InviteView::from(&r)).unwrap();
        assert!(json.get("additional").is_none());
        assert_eq!(json["additionalCount"], 2);
        assert_eq!(json["isAccepted"], false);
        assert_eq!(json["isOpened"], false);
    }

    #[test]
    fn view_reflects_views_and_acceptance() {
        let mut r = InviteRecord::new(vec!["Иван".into()], 2);
        r.record_view(Utc::now());
        r.accept(vec!["Мария".into()], Utc::now()).unwrap();
        let v = InviteView::from(&r);
        assert!(v.is_opened);
        assert!(v.is_accepted);
        assert_eq!(v.additional, Some(vec!["Мария".to_string()]));
    }

    #[test]
    fn update_accepts_both_field_spellings() {
        let a: InviteUpdate = serde_json::from_str(r#"{"isAccepted": true}"#).unwrap();
        let b: InviteUpdate = serde_json::from_str(r#"{"accepted": true, "additional": ["Иван"]}"#).unwrap();
        assert!(a.is_accepted);
        assert!(a.additional.is_none());
        assert!(b.is_accepted);
        assert_eq!(b.additional.as_deref(), Some(&["Иван".to_string()][..]));
    }

    #[test]
    fn update_requires_accept_flag() {
        assert!(serde_json::from_str::<InviteUpdate>(r#"{"additional": []}"#).is_err());
    }
}
