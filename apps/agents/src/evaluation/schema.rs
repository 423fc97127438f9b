//! Canonical evaluation schema and its default table.
//!
//! Every section a candidate record carries is described here once: the dotted
//! target path of each field, the keys a model answer may use for it, and the
//! documented default applied when none of them is present. The back-fill
//! routine in [`super::backfill`] is the only consumer.

use super::keywords::SkillCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    EvaluationResults,
    GapsAnalysis,
    CandidateRating,
    InterviewNotes,
    ResumeParsing,
    JobAnalysis,
}

/// Sections a completed record must always carry.
pub const CORE_SECTIONS: [Section; 4] = [
    Section::EvaluationResults,
    Section::GapsAnalysis,
    Section::CandidateRating,
    Section::InterviewNotes,
];

pub const ALL_SECTIONS: [Section; 6] = [
    Section::ResumeParsing,
    Section::JobAnalysis,
    Section::EvaluationResults,
    Section::GapsAnalysis,
    Section::CandidateRating,
    Section::InterviewNotes,
];

/// Value used when no alias yields an acceptable value.
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    Text(&'static str),
    List(&'static [&'static str]),
    /// Empty for structured answers; keyword-scanned for plain text.
    Skills(SkillCategory),
    /// 3 unless a plain-text answer mentions a rating.
    Rating,
    /// Generated from the section's resolved rating.
    RatingReasoning,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub path: &'static str,
    pub aliases: &'static [&'static str],
    pub fallback: Fallback,
}

const fn field(
    path: &'static str,
    aliases: &'static [&'static str],
    fallback: Fallback,
) -> FieldSpec {
    FieldSpec {
        path,
        aliases,
        fallback,
    }
}

impl Section {
    pub fn key(self) -> &'static str {
        match self {
            Self::EvaluationResults => "evaluation_results",
            Self::GapsAnalysis => "gaps_analysis",
            Self::CandidateRating => "candidate_rating",
            Self::InterviewNotes => "interview_notes",
            Self::ResumeParsing => "resume_parsing",
            Self::JobAnalysis => "job_analysis",
        }
    }

    /// Keys under which a combined answer may nest this section.
    pub fn source_keys(self) -> &'static [&'static str] {
        match self {
            Self::EvaluationResults => &["evaluation_results", "resume_evaluation", "evaluation"],
            Self::GapsAnalysis => &["gaps_analysis", "gap_analysis", "gaps"],
            Self::CandidateRating => &["candidate_rating", "rating_results"],
            Self::InterviewNotes => &["interview_notes", "notes"],
            Self::ResumeParsing => &["resume_parsing", "parsed_resume"],
            Self::JobAnalysis => &["job_analysis", "job_requirements"],
        }
    }

    /// Key holding the untouched model text.
    pub fn raw_key(self) -> Option<&'static str> {
        match self {
            Self::EvaluationResults => Some("raw_evaluation"),
            Self::GapsAnalysis => Some("raw_gaps"),
            Self::CandidateRating => Some("raw_rating"),
            Self::InterviewNotes => Some("raw_notes"),
            Self::ResumeParsing | Self::JobAnalysis => None,
        }
    }

    /// Whether a combined answer without a nested object for this section may
    /// supply its fields from top-level keys.
    pub fn flat_lookup(self) -> bool {
        !matches!(self, Self::ResumeParsing | Self::JobAnalysis)
    }

    /// Whether another flat section also reads `alias` from the top level of
    /// a combined answer. Such keys say nothing about which section they
    /// belong to and are skipped there.
    pub fn alias_is_shared(self, alias: &str) -> bool {
        ALL_SECTIONS
            .iter()
            .filter(|other| **other != self && other.flat_lookup())
            .any(|other| other.fields().iter().any(|f| f.aliases.contains(&alias)))
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::EvaluationResults => EVALUATION_FIELDS,
            Self::GapsAnalysis => GAPS_FIELDS,
            Self::CandidateRating => RATING_FIELDS,
            Self::InterviewNotes => NOTES_FIELDS,
            Self::ResumeParsing => RESUME_FIELDS,
            Self::JobAnalysis => JOB_FIELDS,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field tables
// ────────────────────────────────────────────────────────────────────────────

const EVALUATION_FIELDS: &[FieldSpec] = &[
    field(
        "skills_summary.programming_languages",
        &["skills_summary.programming_languages", "programming_languages"],
        Fallback::Skills(SkillCategory::ProgrammingLanguages),
    ),
    field(
        "skills_summary.ml_frameworks",
        &["skills_summary.ml_frameworks", "ml_frameworks"],
        Fallback::Skills(SkillCategory::MlFrameworks),
    ),
    field(
        "skills_summary.cloud_platforms",
        &["skills_summary.cloud_platforms", "cloud_platforms"],
        Fallback::Skills(SkillCategory::CloudPlatforms),
    ),
    field(
        "skills_summary.tools",
        &["skills_summary.tools", "tools"],
        Fallback::Skills(SkillCategory::Tools),
    ),
    field(
        "skills_summary.databases",
        &["skills_summary.databases", "databases"],
        Fallback::Skills(SkillCategory::Databases),
    ),
    field(
        "skills_summary.big_data",
        &["skills_summary.big_data", "big_data"],
        Fallback::Skills(SkillCategory::BigData),
    ),
    field(
        "technical_expertise.depth",
        &["technical_expertise.depth", "technical_expertise", "technical_assessment", "analysis"],
        Fallback::Text("Technical expertise demonstrated through evaluation"),
    ),
    field(
        "technical_expertise.examples",
        &["technical_expertise.examples", "technical_examples"],
        Fallback::List(&[]),
    ),
    field(
        "experience_summary.years_of_experience",
        &["experience_summary.years_of_experience", "experience_years", "years_of_experience"],
        Fallback::Text("Experience level to be verified"),
    ),
    field(
        "experience_summary.relevant_roles",
        &["experience_summary.relevant_roles", "relevant_roles"],
        Fallback::List(&[]),
    ),
    field(
        "experience_summary.key_achievements",
        &["experience_summary.key_achievements", "key_achievements", "achievements"],
        Fallback::List(&[]),
    ),
    field(
        "job_match_analysis.skills_match",
        &["job_match_analysis.skills_match", "skills_match", "skills_match_percentage", "job_match_analysis"],
        Fallback::Text("Skill alignment to be verified"),
    ),
    field(
        "job_match_analysis.experience_relevance",
        &["job_match_analysis.experience_relevance", "experience_relevance"],
        Fallback::Text("Experience appears relevant to the role"),
    ),
    field(
        "job_match_analysis.education_fit",
        &["job_match_analysis.education_fit", "education_fit"],
        Fallback::Text("Educational background supports the role"),
    ),
    field(
        "job_match_analysis.project_relevance",
        &["job_match_analysis.project_relevance", "project_relevance"],
        Fallback::Text("Projects demonstrate applicable skills"),
    ),
    field(
        "job_match_analysis.technical_depth",
        &["job_match_analysis.technical_depth", "technical_depth"],
        Fallback::Text("Good technical foundation"),
    ),
    field(
        "job_match_analysis.problem_solving",
        &["job_match_analysis.problem_solving", "problem_solving"],
        Fallback::Text("Problem-solving capabilities evident"),
    ),
    field(
        "education_summary.degree",
        &["education_summary.degree", "education_degree"],
        Fallback::Text("Relevant degree in technical field"),
    ),
    field(
        "education_summary.institution",
        &["education_summary.institution", "education_institution"],
        Fallback::Text("Educational institution"),
    ),
    field(
        "education_summary.alignment",
        &["education_summary.alignment", "education_alignment", "education_summary"],
        Fallback::Text("Education supports job requirements"),
    ),
];

const GAPS_FIELDS: &[FieldSpec] = &[
    field(
        "gaps_analysis.skill_mismatches.analysis",
        &[
            "gaps_analysis.skill_mismatches.analysis",
            "skill_mismatches.analysis",
            "skill_mismatches",
            "skill_gaps",
            "missing_skills",
        ],
        Fallback::Text("Skills generally align with requirements"),
    ),
    field(
        "gaps_analysis.skill_mismatches.clarification_needed",
        &[
            "gaps_analysis.skill_mismatches.clarification_needed",
            "skill_mismatches.clarification_needed",
        ],
        Fallback::Text("Verify specific technical competencies"),
    ),
    field(
        "gaps_analysis.experience_gaps.analysis",
        &[
            "gaps_analysis.experience_gaps.analysis",
            "experience_gaps.analysis",
            "experience_gaps",
        ],
        Fallback::Text("Experience level appropriate for role"),
    ),
    field(
        "gaps_analysis.experience_gaps.clarification_needed",
        &[
            "gaps_analysis.experience_gaps.clarification_needed",
            "experience_gaps.clarification_needed",
        ],
        Fallback::Text("Discuss specific project details"),
    ),
    field(
        "gaps_analysis.overall_concerns.analysis",
        &[
            "gaps_analysis.overall_concerns.analysis",
            "overall_concerns.analysis",
            "overall_concerns",
            "analysis",
        ],
        Fallback::Text("No significant concerns identified"),
    ),
    field(
        "gaps_analysis.overall_concerns.clarification_needed",
        &[
            "gaps_analysis.overall_concerns.clarification_needed",
            "overall_concerns.clarification_needed",
            "clarification_needed",
        ],
        Fallback::Text("Clarify open questions during the interview"),
    ),
    field(
        "gaps_analysis.overall_concerns.missing_information",
        &[
            "gaps_analysis.overall_concerns.missing_information",
            "overall_concerns.missing_information",
            "missing_information",
            "missing_info",
        ],
        Fallback::Text("Some details require clarification"),
    ),
    field(
        "gaps_analysis.overall_concerns.areas_for_improvement",
        &[
            "gaps_analysis.overall_concerns.areas_for_improvement",
            "overall_concerns.areas_for_improvement",
            "areas_for_improvement",
            "improvement_areas",
            "development_areas",
        ],
        Fallback::Text("Continuous skill development recommended"),
    ),
    field(
        "gaps_analysis.employment_gaps",
        &["gaps_analysis.employment_gaps", "employment_gaps"],
        Fallback::List(&[]),
    ),
    field(
        "gaps_analysis.job_stability_issues",
        &["gaps_analysis.job_stability_issues", "job_stability_issues"],
        Fallback::List(&[]),
    ),
    field(
        "gaps_analysis.vague_descriptions",
        &["gaps_analysis.vague_descriptions", "vague_descriptions"],
        Fallback::List(&[]),
    ),
    field(
        "gaps_analysis.timeline_inconsistencies",
        &["gaps_analysis.timeline_inconsistencies", "timeline_inconsistencies"],
        Fallback::List(&[]),
    ),
];

const RATING_FIELDS: &[FieldSpec] = &[
    field("rating", &["rating", "score", "overall_rating"], Fallback::Rating),
    field(
        "reasoning",
        &["reasoning", "justification", "rating_reasoning"],
        Fallback::RatingReasoning,
    ),
    field("strengths", &["strengths"], Fallback::List(&[])),
    field("weaknesses", &["weaknesses"], Fallback::List(&[])),
    field(
        "job_fit",
        &["job_fit"],
        Fallback::Text("Candidate shows potential for the role"),
    ),
];

const NOTES_FIELDS: &[FieldSpec] = &[
    field(
        "technical_questions",
        &["technical_questions", "questions"],
        Fallback::List(&[
            "Discuss your experience with machine learning frameworks",
            "Explain your approach to solving technical challenges",
            "Describe your most complex technical project",
        ]),
    ),
    field(
        "experience_questions",
        &["experience_questions"],
        Fallback::List(&[
            "Walk through your professional background",
            "Describe your role in previous projects",
            "Explain how you stay current with technology trends",
        ]),
    ),
    field(
        "skill_verification",
        &["skill_verification"],
        Fallback::List(&[
            "Verify claimed technical skills through examples",
            "Assess depth of knowledge in key areas",
            "Confirm hands-on experience with relevant tools",
        ]),
    ),
    field(
        "concerns_to_address",
        &["concerns_to_address", "concerns"],
        Fallback::List(&[
            "Clarify any experience gaps",
            "Verify technical claims",
            "Assess team collaboration skills",
        ]),
    ),
    field(
        "general_notes.strengths_to_explore",
        &["general_notes.strengths_to_explore", "strengths_to_explore", "focus_areas"],
        Fallback::List(&[
            "Technical capabilities and learning ability",
            "Problem-solving approach",
            "Career motivation and goals",
        ]),
    ),
    field(
        "general_notes.follow_up_actions",
        &["general_notes.follow_up_actions", "follow_up_actions", "talking_points"],
        Fallback::List(&[
            "Technical assessment or coding test",
            "Reference verification",
            "Team fit evaluation",
        ]),
    ),
];

const RESUME_FIELDS: &[FieldSpec] = &[
    field("personal_info.name", &["personal_info.name", "name"], Fallback::Text("")),
    field("personal_info.email", &["personal_info.email", "email"], Fallback::Text("")),
    field("personal_info.phone", &["personal_info.phone", "phone"], Fallback::Text("")),
    field(
        "personal_info.location",
        &["personal_info.location", "location"],
        Fallback::Text(""),
    ),
    field(
        "analysis",
        &["analysis", "summary"],
        Fallback::Text("Resume details were not extracted"),
    ),
    field("experience", &["experience", "work_experience"], Fallback::List(&[])),
    field("education", &["education"], Fallback::List(&[])),
    field(
        "skills.technical",
        &["skills.technical", "technical_skills"],
        Fallback::List(&[]),
    ),
    field("skills.soft", &["skills.soft", "soft_skills"], Fallback::List(&[])),
];

const JOB_FIELDS: &[FieldSpec] = &[
    field(
        "analysis",
        &["analysis", "summary"],
        Fallback::Text("Job requirements were not analyzed"),
    ),
    field(
        "required_skills",
        &["required_skills", "requirements"],
        Fallback::List(&[]),
    ),
    field("preferred_skills", &["preferred_skills"], Fallback::List(&[])),
    field(
        "experience_level",
        &["experience_level", "experience_required"],
        Fallback::Text("Not specified"),
    ),
    field(
        "education_requirements",
        &["education_requirements", "education"],
        Fallback::Text("Not specified"),
    ),
];
