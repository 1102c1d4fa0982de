//! Static descriptors for the three submission kinds.
//!
//! Every endpoint runs the same pipeline; what differs between the campus feedback,
//! general form and security incident flows is captured here as data: the reported
//! required-field list, the staff rule, the selection allow-list, the date field,
//! the media slots and the column mapping of the target table.

/// Which of the three forms a descriptor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    CampusFeedback,
    FormSubmission,
    SecurityIncident,
}

/// A role field whose sentinel value makes a linked identifier mandatory.
#[derive(Debug)]
pub struct StaffRule {
    pub role_field: &'static str,
    pub sentinel: &'static str,
    pub id_field: &'static str,
    pub reason: &'static str,
}

/// Closed set of values a categorical field may take.
#[derive(Debug)]
pub struct Selection {
    pub field: &'static str,
    pub allowed: &'static [&'static str],
}

/// Content types a multipart upload may declare for a slot.
#[derive(Debug, Clone, Copy)]
pub enum Accept {
    /// Any `image/*` type.
    AnyImage,
    Only(&'static [&'static str]),
}

impl Accept {
    pub fn allows(&self, content_type: &str) -> bool {
        let content_type = content_type.trim().to_ascii_lowercase();
        match self {
            Accept::AnyImage => content_type.starts_with("image/"),
            Accept::Only(types) => types.iter().any(|t| *t == content_type),
        }
    }
}

/// Where the decoded bytes of a media slot end up.
#[derive(Debug)]
pub enum Storage {
    /// A single blob column on the submission row.
    Column(&'static str),
    /// An ordered child table keyed by the submission id.
    Gallery {
        table: &'static str,
        owner_column: &'static str,
    },
}

#[derive(Debug)]
pub struct MediaSlot {
    pub name: &'static str,
    /// Whether the slot holds an ordered list instead of exactly one blob.
    pub multiple: bool,
    pub required: bool,
    pub accept: Accept,
    pub missing_reason: &'static str,
    pub storage: Storage,
}

/// How a text column is filled.
#[derive(Debug)]
pub enum Column {
    /// Copied from the named field, NULL when blank.
    Text {
        column: &'static str,
        field: &'static str,
    },
    /// The staff rule's identifier, NULL unless the role equals the sentinel.
    StaffId { column: &'static str },
}

#[derive(Debug)]
pub struct Variant {
    pub kind: VariantKind,
    pub scope: &'static str,
    pub table: &'static str,
    pub success_message: &'static str,
    pub required: &'static [&'static str],
    pub staff_rule: Option<StaffRule>,
    pub selection: Option<Selection>,
    pub date_field: Option<&'static str>,
    pub media: &'static [MediaSlot],
    pub columns: &'static [Column],
    /// Fill blank first/last names from a combined `name` field.
    pub split_full_name: bool,
}

impl Variant {
    pub fn media_slot(&self, name: &str) -> Option<&MediaSlot> {
        self.media.iter().find(|slot| slot.name == name)
    }
}

const fn text(column: &'static str, field: &'static str) -> Column {
    Column::Text { column, field }
}

const CAMPUS_COLUMNS: &[Column] = &[
    text("first_name", "firstName"),
    text("last_name", "lastName"),
    text("gender", "gender"),
    text("email", "email"),
    text("contact", "contact"),
    text("employee_id", "employeeId"),
    text("employee_type", "employeeType"),
    text("employee_status", "employeeStatus"),
    text("event_name", "eventName"),
    text("name", "name"),
    text("mobile_number", "mobileNumber"),
    text("user_type", "userType"),
    Column::StaffId { column: "staff_id" },
    text("feedback", "feedback"),
    text("visit_date", "visitDate"),
];

const FORM_COLUMNS: &[Column] = &[
    text("first_name", "firstName"),
    text("last_name", "lastName"),
    text("gender", "gender"),
    text("email", "email"),
    text("contact", "contact"),
    text("employee_id", "employeeId"),
    text("employee_type", "employeeType"),
    text("employee_status", "employeeStatus"),
    text("event_name", "eventName"),
    text("event_date", "eventDate"),
    text("visitor_type", "visitorType"),
    Column::StaffId { column: "id_number" },
    text("feedback", "feedback"),
    text("form_type", "formType"),
];

const SECURITY_COLUMNS: &[Column] = &[
    text("first_name", "firstName"),
    text("last_name", "lastName"),
    text("gender", "gender"),
    text("email", "email"),
    text("contact", "contact"),
    text("employee_id", "employeeId"),
    text("employee_type", "employeeType"),
    text("employee_status", "employeeStatus"),
    text("selection_type", "selectionType"),
    text("event_name", "eventName"),
    text("event_date", "eventDate"),
    text("name", "name"),
    text("mobile_number", "mobileNumber"),
    text("staff_id", "staffId"),
    text("verification", "verification"),
    text("incident_report", "incidentReport"),
];

pub const SELECTION_TYPES: &[&str] = &[
    "event",
    "students",
    "employees",
    "campus",
    "others-suggestions",
];

pub static CAMPUS_FEEDBACK: Variant = Variant {
    kind: VariantKind::CampusFeedback,
    scope: "/api/campus-form",
    table: "campus_feedback",
    success_message: "Complete feedback data saved successfully!",
    required: &[
        "contact",
        "eventName",
        "name",
        "mobileNumber",
        "userType",
        "feedback",
        "signature",
        "visitDate",
    ],
    staff_rule: Some(StaffRule {
        role_field: "userType",
        sentinel: "Staff",
        id_field: "staffId",
        reason: "Staff ID is required for staff members",
    }),
    selection: None,
    date_field: Some("visitDate"),
    media: &[
        MediaSlot {
            name: "selfieImage",
            multiple: false,
            required: true,
            accept: Accept::AnyImage,
            missing_reason: "Selfie image is required",
            storage: Storage::Column("selfie_image"),
        },
        MediaSlot {
            name: "signature",
            multiple: false,
            required: true,
            accept: Accept::AnyImage,
            missing_reason: "Signature image is required",
            storage: Storage::Column("signature"),
        },
    ],
    columns: CAMPUS_COLUMNS,
    split_full_name: false,
};

pub static FORM_SUBMISSION: Variant = Variant {
    kind: VariantKind::FormSubmission,
    scope: "/api/form-submission",
    table: "form_submissions",
    success_message: "Form data submitted successfully!",
    required: &["firstName", "eventName", "visitorType", "eventDate"],
    staff_rule: Some(StaffRule {
        role_field: "visitorType",
        sentinel: "Staff",
        id_field: "idNumber",
        reason: "ID number is required for staff visitors",
    }),
    selection: None,
    date_field: Some("eventDate"),
    media: &[
        MediaSlot {
            name: "selfie",
            multiple: false,
            required: true,
            accept: Accept::Only(&["image/jpeg", "image/png"]),
            missing_reason: "Selfie image is required",
            storage: Storage::Column("selfie"),
        },
        MediaSlot {
            name: "signature",
            multiple: false,
            required: true,
            accept: Accept::Only(&["image/jpeg", "image/png"]),
            missing_reason: "Signature image is required",
            storage: Storage::Column("signature"),
        },
    ],
    columns: FORM_COLUMNS,
    split_full_name: true,
};

pub static SECURITY_INCIDENT: Variant = Variant {
    kind: VariantKind::SecurityIncident,
    scope: "/api/security-form",
    table: "security_incidents",
    success_message: "Security incident report submitted successfully!",
    required: &[
        "contact",
        "selectionType",
        "eventName",
        "eventDate",
        "name",
        "mobileNumber",
        "staffId",
        "verification",
        "incidentReport",
    ],
    staff_rule: None,
    selection: Some(Selection {
        field: "selectionType",
        allowed: SELECTION_TYPES,
    }),
    date_field: Some("eventDate"),
    media: &[MediaSlot {
        name: "images",
        multiple: true,
        required: true,
        accept: Accept::AnyImage,
        missing_reason: "At least one incident image is required",
        storage: Storage::Gallery {
            table: "security_incident_images",
            owner_column: "incident_id",
        },
    }],
    columns: SECURITY_COLUMNS,
    split_full_name: false,
};

/// Every form served by this process.
pub static ALL: [&Variant; 3] = [&CAMPUS_FEEDBACK, &FORM_SUBMISSION, &SECURITY_INCIDENT];
