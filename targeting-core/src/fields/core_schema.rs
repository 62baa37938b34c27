//! Built-in core field definitions shared by every deployment.

use super::descriptor::{FieldDescriptor, FieldScope, FieldStorage, ValueType, VirtualField};

/// The built-in household and individual fields. Deployments extend this
/// set with custom and periodic definitions through their field source.
pub fn core_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::scalar(
            "size",
            ValueType::Number,
            FieldStorage::Core,
            FieldScope::Household,
        ),
        FieldDescriptor::scalar(
            "residence_status",
            ValueType::Enum,
            FieldStorage::Core,
            FieldScope::Household,
        )
        .with_choices(&["IDP", "REFUGEE", "HOST", "RETURNEE"]),
        FieldDescriptor::scalar(
            "address",
            ValueType::String,
            FieldStorage::Core,
            FieldScope::Household,
        ),
        FieldDescriptor::scalar(
            "registration_date",
            ValueType::Date,
            FieldStorage::Core,
            FieldScope::Household,
        ),
        FieldDescriptor::scalar(
            "sex",
            ValueType::Enum,
            FieldStorage::Core,
            FieldScope::Individual,
        )
        .with_choices(&["MALE", "FEMALE"]),
        FieldDescriptor::scalar(
            "marital_status",
            ValueType::Enum,
            FieldStorage::Core,
            FieldScope::Individual,
        )
        .with_choices(&["SINGLE", "MARRIED", "DIVORCED", "WIDOWED", "SEPARATED"]),
        FieldDescriptor::scalar(
            "birth_date",
            ValueType::Date,
            FieldStorage::Core,
            FieldScope::Individual,
        ),
        FieldDescriptor::scalar(
            "disability",
            ValueType::Enum,
            FieldStorage::Core,
            FieldScope::Individual,
        )
        .with_choices(&["NOT_DISABLED", "DISABLED"]),
        {
            let mut d = FieldDescriptor::scalar(
                "observed_disabilities",
                ValueType::MultiEnum,
                FieldStorage::Core,
                FieldScope::Individual,
            )
            .with_choices(&[
                "NONE",
                "SEEING",
                "HEARING",
                "WALKING",
                "MEMORY",
                "SELF_CARE",
                "COMMUNICATING",
            ]);
            d.multi_valued = true;
            d
        },
        {
            // Virtual: computed from birth_date at evaluation time.
            let mut d = FieldDescriptor::scalar(
                "age",
                ValueType::Number,
                FieldStorage::Core,
                FieldScope::Individual,
            );
            d.virtual_source = Some(VirtualField::AgeFromBirthDate);
            d
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_is_virtual_and_numeric() {
        let fields = core_fields();
        let age = fields.iter().find(|f| f.name == "age").unwrap();
        assert_eq!(age.virtual_source, Some(VirtualField::AgeFromBirthDate));
        assert_eq!(age.value_type, ValueType::Number);
        assert_eq!(age.scope, FieldScope::Individual);
    }

    #[test]
    fn core_names_are_unique() {
        let fields = core_fields();
        let mut names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), fields.len());
    }
}
