//! The site's content resources

use super::{CategoryRule, FieldKind, FieldSpec, ResourceSchema, Selection};

const TITLE: FieldSpec = FieldSpec::new("title", "Title", FieldKind::Text { max: 200 }).required();
const NAME: FieldSpec = FieldSpec::new("name", "Name", FieldKind::Text { max: 150 }).required();
const DESCRIPTION: FieldSpec = FieldSpec::new("description", "Description", FieldKind::LongText);
const FILES: FieldSpec = FieldSpec::new("files", "Files", FieldKind::Files);
const PHOTO: FieldSpec = FieldSpec::new("photo", "Photo", FieldKind::Files);
const DATE: FieldSpec = FieldSpec::new("date", "Date", FieldKind::Date).required();
const EMAIL: FieldSpec = FieldSpec::new("email", "Email", FieldKind::Email);
const PHONE: FieldSpec = FieldSpec::new("phone", "Phone", FieldKind::Text { max: 30 });
const MESSAGE: FieldSpec = FieldSpec::new("message", "Message", FieldKind::LongText);
const DISPLAY_ORDER: FieldSpec = FieldSpec::new(
    "displayOrder",
    "Display order",
    FieldKind::Integer { min: 0, max: 10_000 },
);

const fn content(
    name: &'static str,
    label: &'static str,
    category: CategoryRule,
    fields: &'static [FieldSpec],
) -> ResourceSchema {
    ResourceSchema {
        name,
        label,
        category,
        fields,
        public_read: true,
        public_create: false,
        admin_only_write: false,
        public_fields: Selection::All,
    }
}

const FAQ_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("question", "Question", FieldKind::Text { max: 500 }).required(),
    FieldSpec::new("answer", "Answer", FieldKind::LongText).required(),
    DISPLAY_ORDER,
];
const CAREER_FIELDS: &[FieldSpec] = &[
    TITLE,
    DESCRIPTION.required(),
    FILES,
    DATE,
    FieldSpec::new("deadline", "Application deadline", FieldKind::Date),
];
const BLOG_FIELDS: &[FieldSpec] = &[
    TITLE,
    FieldSpec::new("author", "Author", FieldKind::Text { max: 100 }),
    FieldSpec::new("content", "Content", FieldKind::LongText).required(),
    FILES,
    DATE,
];
const ANNOUNCEMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("title", "Title", FieldKind::Text { max: 300 }).required(),
    DESCRIPTION,
    FILES,
    DATE,
    FieldSpec::new("isHeadline", "Headline", FieldKind::Bool),
];
const NOTICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("title", "Title", FieldKind::Text { max: 300 }).required(),
    DESCRIPTION,
    FILES,
    DATE,
];
const FACULTY_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec::new("designation", "Designation", FieldKind::Text { max: 150 }).required(),
    FieldSpec::new("qualification", "Qualification", FieldKind::Text { max: 300 }),
    EMAIL,
    PHONE,
    PHOTO,
    DISPLAY_ORDER,
];
const GALLERY_FIELDS: &[FieldSpec] = &[TITLE, DESCRIPTION, FILES.required()];
const CAROUSEL_FIELDS: &[FieldSpec] = &[
    TITLE,
    FieldSpec::new("subtitle", "Subtitle", FieldKind::Text { max: 300 }),
    FILES.required(),
    FieldSpec::new("link", "Link", FieldKind::Url),
    DISPLAY_ORDER,
    FieldSpec::new("isActive", "Active", FieldKind::Bool),
];
const CONFIGURATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("key", "Key", FieldKind::Text { max: 100 })
        .required()
        .unique(),
    FieldSpec::new("value", "Value", FieldKind::LongText).required(),
    FieldSpec::new("description", "Description", FieldKind::Text { max: 300 }),
];
const TEAM_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec::new("position", "Position", FieldKind::Text { max: 150 }).required(),
    PHOTO,
    FieldSpec::new("bio", "Biography", FieldKind::LongText),
    DISPLAY_ORDER,
];
const DONATION_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL.required(),
    PHONE,
    FieldSpec::new("amount", "Amount", FieldKind::Number { min: 1.0 }).required(),
    FieldSpec::new("purpose", "Purpose", FieldKind::Text { max: 200 }),
    MESSAGE,
    FieldSpec::new("date", "Date", FieldKind::Date),
];
const MEMBERSHIP_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("fullName", "Full name", FieldKind::Text { max: 150 }).required(),
    EMAIL.required(),
    PHONE.required(),
    FieldSpec::new("address", "Address", FieldKind::Text { max: 300 }),
    FieldSpec::new(
        "membershipType",
        "Membership type",
        FieldKind::Choice {
            options: &["general", "life", "honorary"],
        },
    )
    .required(),
    MESSAGE,
];
const CONTACT_FIELDS: &[FieldSpec] = &[
    NAME,
    EMAIL.required(),
    PHONE,
    FieldSpec::new("subject", "Subject", FieldKind::Text { max: 200 }).required(),
    MESSAGE.required(),
];
const EVENT_FIELDS: &[FieldSpec] = &[
    TITLE,
    DESCRIPTION,
    FieldSpec::new("venue", "Venue", FieldKind::Text { max: 200 }),
    FieldSpec::new("startDate", "Start date", FieldKind::Date).required(),
    FieldSpec::new("endDate", "End date", FieldKind::Date),
    FILES,
];
const TESTIMONIAL_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec::new("designation", "Designation", FieldKind::Text { max: 150 }),
    MESSAGE.required(),
    PHOTO,
    FieldSpec::new("rating", "Rating", FieldKind::Integer { min: 1, max: 5 }),
];
const DOWNLOAD_FIELDS: &[FieldSpec] = &[
    TITLE,
    FILES.required(),
    FieldSpec::new("date", "Date", FieldKind::Date),
];
const ACADEMIC_FIELDS: &[FieldSpec] = &[TITLE, DESCRIPTION, FILES, DISPLAY_ORDER];
const ACHIEVEMENT_FIELDS: &[FieldSpec] = &[TITLE, DESCRIPTION, DATE, FILES];
const PARTNER_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec::new("link", "Website", FieldKind::Url),
    FieldSpec::new("logo", "Logo", FieldKind::Files),
    DISPLAY_ORDER,
];
const ALUMNI_FIELDS: &[FieldSpec] = &[
    NAME,
    FieldSpec::new(
        "batch",
        "Batch",
        FieldKind::Integer {
            min: 1900,
            max: 2100,
        },
    )
    .required(),
    FieldSpec::new("profession", "Profession", FieldKind::Text { max: 150 }),
    MESSAGE,
    PHOTO,
];

static RESOURCES: &[ResourceSchema] = &[
    content("faq", "FAQ", CategoryRule::None, FAQ_FIELDS),
    content("career", "Careers", CategoryRule::None, CAREER_FIELDS),
    content("blog", "Blog", CategoryRule::None, BLOG_FIELDS),
    content("announcement", "Announcements", CategoryRule::Required, ANNOUNCEMENT_FIELDS),
    content("notice", "Notices", CategoryRule::Required, NOTICE_FIELDS),
    content("faculty", "Faculty", CategoryRule::Required, FACULTY_FIELDS),
    content("gallery", "Gallery", CategoryRule::Required, GALLERY_FIELDS),
    content("carousel", "Carousel", CategoryRule::None, CAROUSEL_FIELDS),
    ResourceSchema {
        admin_only_write: true,
        ..content("configuration", "Site configuration", CategoryRule::None, CONFIGURATION_FIELDS)
    },
    content("team", "Team", CategoryRule::Required, TEAM_FIELDS),
    ResourceSchema {
        public_create: true,
        public_fields: Selection::Only(&["name", "amount", "purpose", "message", "date"]),
        ..content("donation", "Donations", CategoryRule::None, DONATION_FIELDS)
    },
    ResourceSchema {
        public_read: false,
        public_create: true,
        ..content("membership", "Membership applications", CategoryRule::None, MEMBERSHIP_FIELDS)
    },
    ResourceSchema {
        public_read: false,
        public_create: true,
        ..content("contact", "Contact messages", CategoryRule::None, CONTACT_FIELDS)
    },
    content("event", "Events", CategoryRule::Required, EVENT_FIELDS),
    content("testimonial", "Testimonials", CategoryRule::None, TESTIMONIAL_FIELDS),
    content("download", "Downloads", CategoryRule::Required, DOWNLOAD_FIELDS),
    content("academic", "Academics", CategoryRule::Required, ACADEMIC_FIELDS),
    content("achievement", "Achievements", CategoryRule::None, ACHIEVEMENT_FIELDS),
    content("partner", "Partners", CategoryRule::None, PARTNER_FIELDS),
    content("alumni", "Alumni", CategoryRule::None, ALUMNI_FIELDS),
];

/// Look up a resource by its URL name
pub fn find(name: &str) -> Option<&'static ResourceSchema> {
    RESOURCES.iter().find(|r| r.name == name)
}

pub fn all() -> &'static [ResourceSchema] {
    RESOURCES
}
