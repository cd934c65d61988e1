//! The five agreement templates
//!
//! Each template is static text plus a list of acknowledgments the second
//! signer checks off. [`build`] turns a template and the supplied signer
//! fields into a [`Document`]; missing fields become [`PLACEHOLDER`] via the
//! accessors on [`SignerFields`].
//!
//! [`PLACEHOLDER`]: super::types::PLACEHOLDER

use super::document::Document;
use super::error::{LegalError, LegalResult};
use super::types::{AgreementType, SignerFields, SignerMap};

struct Section {
    heading: &'static str,
    paragraphs: &'static [&'static str],
    bullets: &'static [&'static str],
}

/// Acknowledgment key and the sentence shown next to its checkbox
type Acknowledgment = (&'static str, &'static str);

const NDA_SECTIONS: &[Section] = &[
    Section {
        heading: "1. Definition of Confidential Information",
        paragraphs: &["\"Confidential Information\" means any non-public information disclosed by the Discloser to the Recipient, whether oral, written or electronic, including:"],
        bullets: &[
            "Product designs, source code and technical documentation",
            "Customer lists, pricing and business plans",
            "Inventory data, photographs and records entrusted to the Discloser by its users",
        ],
    },
    Section {
        heading: "2. Obligations of the Recipient",
        paragraphs: &["The Recipient shall hold Confidential Information in strict confidence, use it solely to evaluate or perform the business relationship between the parties, and not disclose it to any third party without the Discloser's prior written consent."],
        bullets: &[],
    },
    Section {
        heading: "3. Exclusions",
        paragraphs: &["Confidential Information does not include information that is or becomes public through no fault of the Recipient, was lawfully known to the Recipient before disclosure, or is independently developed without use of the Confidential Information."],
        bullets: &[],
    },
    Section {
        heading: "4. Term and Return of Materials",
        paragraphs: &[
            "The obligations in this Agreement survive for three (3) years after the last disclosure.",
            "Upon request the Recipient shall promptly return or destroy all materials containing Confidential Information.",
        ],
        bullets: &[],
    },
    Section {
        heading: "5. General",
        paragraphs: &["This Agreement is the entire agreement of the parties on its subject matter and may be amended only in a writing signed by both parties."],
        bullets: &[],
    },
];

const NDA_ACKNOWLEDGMENTS: &[Acknowledgment] = &[
    ("read_terms", "I have read and understand the terms of this Agreement."),
    ("return_materials", "I will return or destroy Confidential Information on request."),
    ("no_third_parties", "I will not share Confidential Information with third parties."),
];

const CONFIDENTIALITY_SECTIONS: &[Section] = &[
    Section {
        heading: "1. Scope",
        paragraphs: &["The Developer will have access to the Company's source code, infrastructure credentials, user data and product roadmap (together, \"Company Information\") while providing development services."],
        bullets: &[],
    },
    Section {
        heading: "2. Handling of Company Information",
        paragraphs: &["The Developer shall:"],
        bullets: &[
            "Access Company Information only from devices protected by disk encryption and a screen lock",
            "Never copy user data to personal storage or third-party services",
            "Report any suspected breach to the Company within 24 hours",
        ],
    },
    Section {
        heading: "3. Ownership of Work Product",
        paragraphs: &["All code, designs and documentation the Developer produces for the Company are works made for hire and the exclusive property of the Company."],
        bullets: &[],
    },
    Section {
        heading: "4. Duration",
        paragraphs: &["These obligations continue during the engagement and for five (5) years after it ends."],
        bullets: &[],
    },
];

const CONFIDENTIALITY_ACKNOWLEDGMENTS: &[Acknowledgment] = &[
    ("read_terms", "I have read and understand the terms of this Agreement."),
    ("secure_devices", "I will only access Company Information from secured devices."),
    ("report_breaches", "I will report suspected breaches within 24 hours."),
];

const OFFSHORE_SECTIONS: &[Section] = &[
    Section {
        heading: "1. Purpose",
        paragraphs: &["This Addendum supplements the Developer's existing agreement with the Company for services performed outside the Company's home jurisdiction."],
        bullets: &[],
    },
    Section {
        heading: "2. Data Residency",
        paragraphs: &["Production user data shall remain in the Company's approved hosting regions. The Developer shall work only with anonymised or synthetic data sets unless the Company grants written approval."],
        bullets: &[],
    },
    Section {
        heading: "3. Compliance",
        paragraphs: &["The Developer shall comply with applicable export control, privacy and data-protection laws, including:"],
        bullets: &[
            "Local data-protection law where the Developer resides",
            "Privacy obligations the Company owes its users",
            "Export restrictions on encryption software",
        ],
    },
    Section {
        heading: "4. Governing Law",
        paragraphs: &["Disputes under this Addendum are governed by the law that governs the underlying agreement."],
        bullets: &[],
    },
];

const OFFSHORE_ACKNOWLEDGMENTS: &[Acknowledgment] = &[
    ("read_terms", "I have read and understand the terms of this Addendum."),
    ("data_residency", "I will not move production data outside approved regions."),
    ("local_law", "I am permitted to perform this work under local law."),
];

const CONTRACTOR_SECTIONS: &[Section] = &[
    Section {
        heading: "1. Services",
        paragraphs: &["The Contractor will provide the services described in each statement of work issued by the Company."],
        bullets: &[],
    },
    Section {
        heading: "2. Independent Contractor Status",
        paragraphs: &["The Contractor is an independent contractor and not an employee, partner or agent of the Company. The Contractor is responsible for their own taxes, insurance and equipment."],
        bullets: &[],
    },
    Section {
        heading: "3. Compensation",
        paragraphs: &["The Company will pay the rates stated in each statement of work within thirty (30) days of receiving a valid invoice."],
        bullets: &[],
    },
    Section {
        heading: "4. Intellectual Property",
        paragraphs: &["The Contractor assigns to the Company all rights in deliverables created under this Agreement, and waives any moral rights in them to the extent permitted by law."],
        bullets: &[],
    },
    Section {
        heading: "5. Confidentiality and Termination",
        paragraphs: &[
            "The Contractor shall keep the Company's non-public information confidential during and after the engagement.",
            "Either party may terminate this Agreement with fourteen (14) days' written notice.",
        ],
        bullets: &[],
    },
];

const CONTRACTOR_ACKNOWLEDGMENTS: &[Acknowledgment] = &[
    ("read_terms", "I have read and understand the terms of this Agreement."),
    ("independent_status", "I understand I am not an employee of the Company."),
    ("ip_assignment", "I assign all rights in my deliverables to the Company."),
    ("tax_responsibility", "I am responsible for my own taxes."),
];

const EQUITY_SECTIONS: &[Section] = &[
    Section {
        heading: "1. Grant",
        paragraphs: &["Subject to this Agreement and the Company's equity plan, the Company grants the Grantee an award of equity in the Company (the \"Award\")."],
        bullets: &[],
    },
    Section {
        heading: "2. Vesting",
        paragraphs: &["The Award vests over four (4) years as follows:"],
        bullets: &[
            "25% on the first anniversary of the Effective Date (the cliff)",
            "The remainder in equal monthly instalments over the following 36 months",
            "Vesting stops when the Grantee's service to the Company ends",
        ],
    },
    Section {
        heading: "3. Restrictions",
        paragraphs: &["Unvested equity may not be sold, transferred or pledged. Vested equity remains subject to the Company's right of first refusal."],
        bullets: &[],
    },
    Section {
        heading: "4. Tax Matters",
        paragraphs: &["The Grantee is responsible for all taxes arising from the Award and has been advised to consult an independent tax advisor."],
        bullets: &[],
    },
];

const EQUITY_ACKNOWLEDGMENTS: &[Acknowledgment] = &[
    ("read_terms", "I have read and understand the terms of this Agreement."),
    ("vesting_schedule", "I understand the vesting schedule and cliff."),
    ("tax_advice", "I have had the opportunity to obtain independent tax advice."),
];

fn sections(agreement: AgreementType) -> &'static [Section] {
    match agreement {
        AgreementType::Nda => NDA_SECTIONS,
        AgreementType::Confidentiality => CONFIDENTIALITY_SECTIONS,
        AgreementType::OffshoreAddendum => OFFSHORE_SECTIONS,
        AgreementType::ContractorPack => CONTRACTOR_SECTIONS,
        AgreementType::EquityGrant => EQUITY_SECTIONS,
    }
}

/// Acknowledgments the second signer checks off
pub fn acknowledgments(agreement: AgreementType) -> &'static [(&'static str, &'static str)] {
    match agreement {
        AgreementType::Nda => NDA_ACKNOWLEDGMENTS,
        AgreementType::Confidentiality => CONFIDENTIALITY_ACKNOWLEDGMENTS,
        AgreementType::OffshoreAddendum => OFFSHORE_ACKNOWLEDGMENTS,
        AgreementType::ContractorPack => CONTRACTOR_ACKNOWLEDGMENTS,
        AgreementType::EquityGrant => EQUITY_ACKNOWLEDGMENTS,
    }
}

/// Build the document for `agreement` from the supplied signer fields
pub fn build(agreement: AgreementType, signers: &SignerMap) -> LegalResult<Document> {
    let roles = agreement.roles();
    if let Some(role) = signers.keys().find(|r| !roles.contains(r)) {
        return Err(LegalError::UnknownRole {
            role: *role,
            agreement,
        });
    }

    let empty = SignerFields::default();
    let fields_for = |index: usize| roles.get(index).and_then(|r| signers.get(r)).unwrap_or(&empty);
    let first = fields_for(0);
    let second = fields_for(1);
    let (first_label, second_label) = (roles[0].label(), roles[1].label());

    let mut doc = Document::new(agreement.title())
        .paragraph(format!(
            "This {} (the \"Agreement\") is entered into as of {} (the \"Effective Date\") by and between {} (the \"{}\") and {} (the \"{}\").",
            agreement.title(),
            first.date(),
            first.name(),
            first_label,
            second.name(),
            second_label,
        ))
        .spacer(6.0);

    for section in sections(agreement) {
        doc = doc.heading(section.heading);
        for paragraph in section.paragraphs {
            doc = doc.paragraph(*paragraph);
        }
        doc = doc.bullets(section.bullets.iter().copied());
    }

    doc = doc.heading(format!("{} Acknowledgments", second_label));
    for (key, text) in acknowledgments(agreement) {
        doc = doc.acknowledgment(second.acknowledged(key), *text);
    }

    doc = doc
        .spacer(12.0)
        .heading("Signatures")
        .paragraph("IN WITNESS WHEREOF, the parties have executed this Agreement as of the Effective Date.");

    for role in roles {
        let fields = signers.get(role).unwrap_or(&empty);
        doc = doc.signature(role.label(), signature_fields(fields));
    }

    Ok(doc)
}

fn signature_fields(fields: &SignerFields) -> Vec<(String, String)> {
    [
        ("Name", fields.name()),
        ("Email", fields.email()),
        ("Location", fields.location()),
        ("Signature", fields.signature()),
        ("Date", fields.date()),
    ]
    .iter()
    .map(|(label, value)| (label.to_string(), value.to_string()))
    .collect()
}
