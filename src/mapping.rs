//! Entity <-> DTO mapping.
//!
//! Each pair is declared once as a field table; [`mapping!`] expands it into
//! both `From` directions so the two can't drift. Entity -> DTO is the full
//! read projection and maps a loaded relation recursively. DTO -> entity is
//! the flat write projection: the foreign-key scalar survives, the nested
//! expansion is dropped.

use crate::dto::{
    CitationDto, ConversationDto, ConversationTypeDto, GenAiModelDto, MessageDto,
    SystemPromptOverrideDto, UserFeedbackDto,
};
use crate::entities::{
    Citation, Conversation, ConversationType, GenAiModel, Message, SystemPromptOverride,
    UserFeedback,
};

macro_rules! mapping {
    (
        $entity:ident <=> $dto:ident {
            $($field:ident),+ $(,)?
        }
        $(expand $rel:ident)?
    ) => {
        impl From<&$entity> for $dto {
            fn from(entity: &$entity) -> Self {
                Self {
                    $($field: entity.$field.clone(),)+
                    audit: entity.audit.clone(),
                    $($rel: entity.$rel.as_ref().map(Into::into),)?
                }
            }
        }

        impl From<&$dto> for $entity {
            fn from(dto: &$dto) -> Self {
                Self {
                    $($field: dto.$field.clone(),)+
                    audit: dto.audit.clone(),
                    $($rel: None,)?
                }
            }
        }
    };
}

mapping!(GenAiModel <=> GenAiModelDto {
    id, name, provider, version, license, is_active,
});

mapping!(ConversationType <=> ConversationTypeDto {
    id, name, default_system_prompt, version, is_active, risk_level, use_case_category,
});

mapping!(Conversation <=> ConversationDto {
    id, user_id, conversation_type_id, started_at,
} expand conversation_type);

mapping!(SystemPromptOverride <=> SystemPromptOverrideDto {
    id, conversation_id, overridden_prompt, prompt_type, reason_for_override, version, set_at,
});

mapping!(Message <=> MessageDto {
    id, conversation_id, sender, message_sequence, content, relevance_percentage, model_id,
    was_decision_made, requires_human_review, is_final_output,
} expand model);

mapping!(Citation <=> CitationDto {
    id, message_id, source_url, description,
});

mapping!(UserFeedback <=> UserFeedbackDto {
    id, message_id, rating, feedback_type, comments, feedback_source, submitted_by, submitted_at,
});

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::audit::Audit;
    use crate::entities::{RiskLevel, Sender};

    fn audit() -> Audit {
        Audit {
            created_by: Some("alice".into()),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            modified_by: Some("bob".into()),
            modified_at: Some(Utc.with_ymd_and_hms(2024, 5, 2, 11, 0, 0).unwrap()),
            is_deleted: false,
        }
    }

    fn model() -> GenAiModel {
        GenAiModel {
            id: 4,
            name: "gpt-4o".into(),
            provider: Some("OpenAI".into()),
            version: Some("2024-05-13".into()),
            license: None,
            is_active: true,
            audit: audit(),
        }
    }

    fn conversation_type() -> ConversationType {
        ConversationType {
            id: 2,
            name: "Claims triage".into(),
            default_system_prompt: "You triage insurance claims.".into(),
            version: 3,
            is_active: true,
            risk_level: Some(RiskLevel::High),
            use_case_category: Some("insurance".into()),
            audit: audit(),
        }
    }

    fn message(model: Option<GenAiModel>) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender: Sender::Assistant,
            message_sequence: 7,
            content: "Claim looks valid.".into(),
            relevance_percentage: Some(dec!(92.125)),
            model_id: Some(4),
            was_decision_made: true,
            requires_human_review: true,
            is_final_output: false,
            audit: audit(),
            model,
        }
    }

    #[test]
    fn model_round_trip() {
        let entity = model();
        let back = GenAiModel::from(&GenAiModelDto::from(&entity));
        assert_eq!(back, entity);
    }

    #[test]
    fn conversation_type_round_trip() {
        let entity = conversation_type();
        let back = ConversationType::from(&ConversationTypeDto::from(&entity));
        assert_eq!(back, entity);
    }

    #[test]
    fn conversation_maps_loaded_type_and_drops_it_on_return() {
        let entity = Conversation {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            conversation_type_id: 2,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            audit: audit(),
            conversation_type: Some(conversation_type()),
        };

        let dto = ConversationDto::from(&entity);
        let nested = dto.conversation_type.as_ref().unwrap();
        assert_eq!(nested.name, "Claims triage");
        assert_eq!(nested.risk_level, Some(RiskLevel::High));
        assert_eq!(nested.audit, audit());

        let back = Conversation::from(&dto);
        assert!(back.conversation_type.is_none());
        assert_eq!(back.conversation_type_id, 2);
        assert_eq!(
            back,
            Conversation {
                conversation_type: None,
                ..entity
            }
        );
    }

    #[test]
    fn unloaded_relation_stays_absent() {
        let dto = MessageDto::from(&message(None));
        assert!(dto.model.is_none());
        assert_eq!(dto.model_id, Some(4));
    }

    #[test]
    fn message_maps_model_recursively() {
        let entity = message(Some(model()));
        let dto = MessageDto::from(&entity);
        assert_eq!(dto.model, Some(GenAiModelDto::from(&model())));
        assert_eq!(dto.relevance_percentage, Some(dec!(92.125)));

        let back = Message::from(&dto);
        assert!(back.model.is_none());
        assert_eq!(back, Message { model: None, ..entity });
    }

    #[test]
    fn prompt_override_citation_feedback_round_trip() {
        let over = SystemPromptOverride {
            id: 11,
            conversation_id: Uuid::new_v4(),
            overridden_prompt: "Answer in French.".into(),
            prompt_type: Some("Language".into()),
            reason_for_override: Some("customer request".into()),
            version: 2,
            set_at: Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap(),
            audit: audit(),
        };
        assert_eq!(SystemPromptOverride::from(&SystemPromptOverrideDto::from(&over)), over);

        let citation = Citation {
            id: 5,
            message_id: Uuid::new_v4(),
            source_url: "https://example.org/policy.pdf".into(),
            description: None,
            audit: Audit {
                is_deleted: true,
                ..audit()
            },
        };
        assert_eq!(Citation::from(&CitationDto::from(&citation)), citation);

        let feedback = UserFeedback {
            id: 9,
            message_id: Uuid::new_v4(),
            rating: 0,
            feedback_type: Some("flagged".into()),
            comments: Some("wrong policy number".into()),
            feedback_source: Some("Slack".into()),
            submitted_by: Some("carol".into()),
            submitted_at: Utc.with_ymd_and_hms(2024, 5, 4, 16, 45, 0).unwrap(),
            audit: audit(),
        };
        // Out-of-range ratings are copied, not rejected.
        assert_eq!(UserFeedback::from(&UserFeedbackDto::from(&feedback)), feedback);
    }
}
