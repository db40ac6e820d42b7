//! The sixteen precepts: the three refuges, the three pure precepts, and the
//! ten grave precepts, with the reflection prompts offered for each.

use serde::Serialize;

use crate::models::PRECEPT_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreceptGroup {
    ThreeRefuges,
    ThreePurePrecepts,
    TenGravePrecepts,
}

impl PreceptGroup {
    pub const ALL: [PreceptGroup; 3] = [
        PreceptGroup::ThreeRefuges,
        PreceptGroup::ThreePurePrecepts,
        PreceptGroup::TenGravePrecepts,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PreceptGroup::ThreeRefuges => "The Three Refuges",
            PreceptGroup::ThreePurePrecepts => "The Three Pure Precepts",
            PreceptGroup::TenGravePrecepts => "The Ten Grave Precepts",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            PreceptGroup::ThreeRefuges => {
                "Taking refuge is the fundamental act of becoming a Buddhist. You place \
                 yourself under the protection of, and commit yourself to, these three treasures."
            }
            PreceptGroup::ThreePurePrecepts => {
                "The broadest ethical guidelines, sometimes called the three collective pure \
                 precepts. Everything else flows from them."
            }
            PreceptGroup::TenGravePrecepts => {
                "More specific ethical guidelines. In Soto Zen, they are understood not as \
                 commandments but as descriptions of how an awakened person naturally lives."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Precept {
    pub number: i64,
    pub group: PreceptGroup,
    pub vow: &'static str,
    pub short_name: &'static str,
    pub description: &'static str,
    pub default_prompts: &'static [&'static str],
}

/// Look up a precept by its number (1-16).
#[must_use]
pub fn precept(number: i64) -> Option<&'static Precept> {
    PRECEPTS.iter().find(|p| p.number == number)
}

pub fn precepts_in(group: PreceptGroup) -> impl Iterator<Item = &'static Precept> {
    PRECEPTS.iter().filter(move |p| p.group == group)
}

pub const PRECEPTS: [Precept; PRECEPT_COUNT as usize] = [
    Precept {
        number: 1,
        group: PreceptGroup::ThreeRefuges,
        vow: "I take refuge in Buddha",
        short_name: "Refuge in Buddha",
        description: "Taking refuge in Buddha means trusting that awakening is possible, for the \
             historical Buddha, for all beings, for you. Buddha also means your own awakened \
             nature, the capacity for enlightenment already present.",
        default_prompts: &[
            "Was there a moment today when you doubted your ability to grow or change? What happened?",
            "Did you notice yourself or someone else acting with genuine wisdom today? What did it look like?",
            "When did you feel most awake and present today?",
            "Was there a situation where you trusted your own capacity to handle something difficult?",
            "Did you catch yourself thinking \"I could never...\" about something? What was it?",
            "Was there a moment today when you paused before reacting and found clarity?",
        ],
    },
    Precept {
        number: 2,
        group: PreceptGroup::ThreeRefuges,
        vow: "I take refuge in Dharma",
        short_name: "Refuge in Dharma",
        description: "Taking refuge in Dharma means committing to the teachings as your guide and \
             trusting reality as it is, even when it is difficult. It means aligning yourself \
             with what is true rather than with your preferences and delusions.",
        default_prompts: &[
            "Was there a moment today when you resisted accepting something as it is? What was the situation?",
            "Did you learn something today that shifted your understanding, even slightly?",
            "When did you catch yourself believing a story about a situation rather than seeing it clearly?",
            "Was there a conversation where you heard something true that was hard to hear?",
            "Did you notice a gap between how you wanted things to be and how they actually were?",
            "What did reality teach you today that your plans did not account for?",
        ],
    },
    Precept {
        number: 3,
        group: PreceptGroup::ThreeRefuges,
        vow: "I take refuge in Sangha",
        short_name: "Refuge in Sangha",
        description: "Taking refuge in Sangha means recognizing you cannot do this alone and \
             committing to practice with others. It also means recognizing the \
             interconnection of all beings, the sangha in its widest sense includes everyone.",
        default_prompts: &[
            "Did someone support you today in a way you did not expect? How did it feel?",
            "Was there a moment where you felt disconnected from the people around you? What happened?",
            "Did you reach out to someone today, or did someone reach out to you?",
            "Was there a time when working with others made something easier or better than doing it alone?",
            "Did you notice yourself pulling away from community or connection today? Why?",
            "How did you contribute to someone else's well-being today, even in a small way?",
        ],
    },
    Precept {
        number: 4,
        group: PreceptGroup::ThreePurePrecepts,
        vow: "I vow to refrain from all evil",
        short_name: "Refrain from Evil",
        description: "The precept of restraint. You vow to stop doing harm, to others, to yourself, to \
             the world. It acknowledges that your actions have consequences and that some \
             actions cause suffering.",
        default_prompts: &[
            "Was there a moment today when you chose not to do something because you knew it would cause harm?",
            "Did you notice a habit or impulse that could hurt someone, including yourself? How did you respond?",
            "Were there words you almost said but held back because they would have been hurtful?",
            "Did you make a choice today that you later realized caused unnecessary harm?",
            "Was there a situation where the easy path would have been harmful and you chose differently?",
        ],
    },
    Precept {
        number: 5,
        group: PreceptGroup::ThreePurePrecepts,
        vow: "I vow to do all good",
        short_name: "Do All Good",
        description: "The precept of active virtue. It is not enough to avoid harm; you also cultivate \
             what is beneficial. Kindness, generosity, compassion, wisdom, these are to be \
             actively developed, not just passively hoped for.",
        default_prompts: &[
            "What is one kind thing you did today that you might normally overlook?",
            "Did you have an opportunity to help someone and take it? What happened?",
            "Was there a moment when you could have been generous, with your time, attention, or resources, and followed through?",
            "Did you actively encourage or support someone today? Who and how?",
            "Was there a situation where you went out of your way to do something good, even when it was inconvenient?",
        ],
    },
    Precept {
        number: 6,
        group: PreceptGroup::ThreePurePrecepts,
        vow: "I vow to save all beings",
        short_name: "Save All Beings",
        description: "The bodhisattva vow, the heart of Mahayana Buddhism. You commit to awakening not \
             just for yourself but for the benefit of all beings. It orients your life toward \
             service rather than personal attainment.",
        default_prompts: &[
            "Did you act today with someone else's benefit in mind, not just your own?",
            "Was there a moment where you put aside your own agenda to be present for someone?",
            "Did you notice suffering in someone around you today? How did you respond?",
            "Was there a decision you made today that considered its impact on others beyond yourself?",
            "Did you find yourself ignoring someone's need because you were focused on your own concerns?",
        ],
    },
    Precept {
        number: 7,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to kill",
        short_name: "Affirming Life",
        description: "The precept of affirming life. This extends into how you relate to all living \
             things, how you handle insects, what you eat, how you speak about others. It \
             invites continuous examination of how you support or diminish life.",
        default_prompts: &[
            "How did you support or nurture life today, in your home, at work, or in passing?",
            "Did your words build someone up or diminish them today?",
            "Was there a moment where you chose care over convenience with another living being?",
            "Did you notice yourself dismissing or devaluing someone's experience today?",
            "How did you take care of your own vitality, rest, nourishment, movement?",
        ],
    },
    Precept {
        number: 8,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to steal",
        short_name: "Not Taking What Is Not Given",
        description: "Beyond obvious theft, this includes taking more than your share, exploiting \
             others' labor, wasting resources, taking credit for others' work. Positively, it \
             points toward generosity and being satisfied with what you have.",
        default_prompts: &[
            "Did you take credit for something today that was not entirely yours?",
            "Was there a moment when you took more than your fair share, of time, space, food, or attention?",
            "Did you feel envy or a sense of lacking today? What triggered it?",
            "Were you generous with something today, your time, a compliment, your patience?",
            "Did you respect other people's time and energy in your interactions today?",
        ],
    },
    Precept {
        number: 9,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to misuse sexuality",
        short_name: "Respecting the Body",
        description: "The precept of respecting the body and intimate relationships. It means bringing \
             awareness and care to this powerful dimension of human life rather than acting \
             out of compulsion.",
        default_prompts: &[
            "Did you treat your own body with care and respect today?",
            "Were you mindful of boundaries, yours and others', in your interactions today?",
            "Was there a moment when you noticed objectifying someone or reducing them to appearance?",
            "Did you honor your commitments to the people closest to you today?",
            "Were there moments today where you acted from genuine care rather than habit or compulsion in your relationships?",
        ],
    },
    Precept {
        number: 10,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to lie",
        short_name: "Truthful Speech",
        description: "Beyond not telling outright lies, this includes not exaggerating, not omitting \
             important truths, not using words to manipulate. It also means being honest with \
             yourself, not hiding from uncomfortable realities.",
        default_prompts: &[
            "Was there a moment today where you chose honesty even when it was uncomfortable?",
            "Did you catch yourself exaggerating or softening the truth? What was the situation?",
            "Were you honest with yourself about something you would rather not face?",
            "Did you withhold something important from someone? Why?",
            "Was there a conversation where you said exactly what you meant, clearly and kindly?",
        ],
    },
    Precept {
        number: 11,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to intoxicate self or others",
        short_name: "Clarity",
        description: "The precept of clarity. This extends to anything that clouds awareness or \
             encourages escapism, excessive entertainment, compulsive consumption, even \
             spiritual bypassing. The question is: what do you use to avoid being present?",
        default_prompts: &[
            "Did you reach for something today to numb or distract yourself? What was it?",
            "Was there a time today when you chose to stay present with discomfort instead of escaping it?",
            "How much of your screen time today was intentional versus autopilot?",
            "Did you notice yourself consuming something, food, media, shopping, out of boredom or avoidance?",
            "Was there a moment of genuine clarity today where you saw a situation exactly as it was?",
        ],
    },
    Precept {
        number: 12,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to speak of the faults of others",
        short_name: "Not Elevating Self by Criticizing Others",
        description: "Gossip, complaining about people behind their backs, dwelling on others' \
             shortcomings, these actions harm both the person spoken about and the speaker. \
             The question is: are you speaking to help, or to make yourself feel superior?",
        default_prompts: &[
            "Did you talk about someone behind their back today? What motivated it?",
            "Was there a moment when you caught yourself about to gossip and stopped?",
            "Did you complain about a coworker, friend, or family member today? Was it necessary or just venting?",
            "When you noticed someone else's flaw today, did you sit with it quietly or share it with others?",
            "Was there an opportunity to speak well of someone who was not present? Did you take it?",
        ],
    },
    Precept {
        number: 13,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to praise myself while abusing others",
        short_name: "Humility",
        description: "This focuses on self-aggrandizing comparison. Putting others down to elevate \
             yourself is a particularly toxic pattern. The precept invites you to notice when \
             you are doing this, even subtly.",
        default_prompts: &[
            "Did you compare yourself favorably to someone else today? What was the context?",
            "Was there a moment when you highlighted your own success at someone else's expense?",
            "Did you notice yourself feeling superior to someone today? What triggered it?",
            "Was there a time when you let someone else take the spotlight instead of claiming it?",
            "Did you downplay someone else's contribution in a conversation today?",
        ],
    },
    Precept {
        number: 14,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to be possessive of anything",
        short_name: "Generosity",
        description: "Clinging to possessions, status, relationships, ideas, all of this creates \
             suffering. The precept does not mean you cannot have things; it means holding \
             them lightly, recognizing their impermanence, and being willing to share and let \
             go.",
        default_prompts: &[
            "Did you cling tightly to something today, a plan, an opinion, a possession? What was it?",
            "Was there a moment when you shared something freely without expecting anything in return?",
            "Did you feel anxious about losing something today, a role, a relationship, a routine?",
            "Were you able to let go of something today, even something small, with ease?",
            "Did you notice yourself hoarding, time, information, resources, when you could have been open-handed?",
        ],
    },
    Precept {
        number: 15,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to harbor ill will",
        short_name: "Loving-Kindness",
        description: "Anger arises, that is natural. But nursing resentment, cultivating hatred, \
             holding grudges, these poison your own mind as much as they harm others. The \
             practice is to feel anger when it arises and then let it move through.",
        default_prompts: &[
            "Did you hold onto anger or resentment toward someone today? What was it about?",
            "Was there a moment when you felt irritation and let it pass without acting on it?",
            "Did you wish someone ill today, even silently? What prompted it?",
            "Was there a grudge or old resentment that came up today? Were you able to soften around it?",
            "Did you respond to a frustrating person or situation today with patience instead of hostility?",
        ],
    },
    Precept {
        number: 16,
        group: PreceptGroup::TenGravePrecepts,
        vow: "I vow not to disparage the Three Treasures",
        short_name: "Honoring the Path",
        description: "Disparaging the Three Treasures includes dismissing your own capacity for \
             awakening (Buddha), denying truth or deceiving yourself (Dharma), and separating \
             yourself from others (Sangha). It is a vow to keep faith with the path.",
        default_prompts: &[
            "Did you dismiss your own practice or growth today, telling yourself it does not matter?",
            "Was there a moment when you deceived yourself about something important?",
            "Did you separate yourself from others today, physically, emotionally, or mentally, out of cynicism or despair?",
            "Were you able to appreciate something about your practice today, even if it felt small?",
            "Did you catch yourself thinking that your efforts at self-awareness are pointless? What was happening?",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precepts_numbered_in_order() {
        for (i, p) in PRECEPTS.iter().enumerate() {
            assert_eq!(p.number, i as i64 + 1);
            assert!(!p.default_prompts.is_empty());
        }
    }

    #[test]
    fn test_precept_lookup() {
        let p = precept(10).unwrap();
        assert_eq!(p.vow, "I vow not to lie");
        assert_eq!(p.short_name, "Truthful Speech");
        assert!(precept(0).is_none());
        assert!(precept(17).is_none());
    }

    #[test]
    fn test_group_sizes() {
        assert_eq!(precepts_in(PreceptGroup::ThreeRefuges).count(), 3);
        assert_eq!(precepts_in(PreceptGroup::ThreePurePrecepts).count(), 3);
        assert_eq!(precepts_in(PreceptGroup::TenGravePrecepts).count(), 10);
        let numbers: Vec<i64> = precepts_in(PreceptGroup::ThreePurePrecepts)
            .map(|p| p.number)
            .collect();
        assert_eq!(numbers, vec![4, 5, 6]);
    }

    #[test]
    fn test_group_serializes_kebab_case() {
        let json = serde_json::to_string(&PreceptGroup::TenGravePrecepts).unwrap();
        assert_eq!(json, "\"ten-grave-precepts\"");
    }
}
