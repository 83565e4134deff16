pub mod company {
    use crate::models::Company;
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "companies")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub name: String,
        pub logo_content: Option<Vec<u8>>,
        pub logo_content_type: Option<String>,
        pub logo_file_extension: Option<String>,
        pub logo_url: Option<String>,
        pub registration_number: Option<String>,
        pub vat_number: Option<String>,
        pub contact_email: Option<String>,
        pub primary_admin_id: Option<Uuid>,
        pub deleted: bool,
        pub deleted_by: Option<Uuid>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Company {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                name: model.name,
                logo_content: model.logo_content,
                logo_content_type: model.logo_content_type,
                logo_file_extension: model.logo_file_extension,
                logo_url: model.logo_url,
                registration_number: model.registration_number,
                vat_number: model.vat_number,
                contact_email: model.contact_email,
                primary_admin_id: model.primary_admin_id,
                deleted: model.deleted,
                deleted_by: model.deleted_by,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Company> for ActiveModel {
        fn from(company: Company) -> Self {
            ActiveModel {
                id: Set(company.id),
                name: Set(company.name),
                logo_content: Set(company.logo_content),
                logo_content_type: Set(company.logo_content_type),
                logo_file_extension: Set(company.logo_file_extension),
                logo_url: Set(company.logo_url),
                registration_number: Set(company.registration_number),
                vat_number: Set(company.vat_number),
                contact_email: Set(company.contact_email),
                primary_admin_id: Set(company.primary_admin_id),
                deleted: Set(company.deleted),
                deleted_by: Set(company.deleted_by),
                created_at: Set(company.created_at.into()),
                updated_at: Set(company.updated_at.into()),
            }
        }
    }
}

pub mod admin_rights {
    use crate::models::CompanyAdminRights;
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "company_admin_rights")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub company_id: Uuid,
        pub user_id: Uuid,
        pub can_add_remove_sellers: bool,
        pub can_promote_demote_admins: bool,
        pub can_delegate_admin_rights: bool,
        pub approved: bool,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for CompanyAdminRights {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                company_id: model.company_id,
                user_id: model.user_id,
                can_add_remove_sellers: model.can_add_remove_sellers,
                can_promote_demote_admins: model.can_promote_demote_admins,
                can_delegate_admin_rights: model.can_delegate_admin_rights,
                approved: model.approved,
                created_at: model.created_at.into(),
            }
        }
    }

    impl From<CompanyAdminRights> for ActiveModel {
        fn from(rights: CompanyAdminRights) -> Self {
            ActiveModel {
                id: Set(rights.id),
                company_id: Set(rights.company_id),
                user_id: Set(rights.user_id),
                can_add_remove_sellers: Set(rights.can_add_remove_sellers),
                can_promote_demote_admins: Set(rights.can_promote_demote_admins),
                can_delegate_admin_rights: Set(rights.can_delegate_admin_rights),
                approved: Set(rights.approved),
                created_at: Set(rights.created_at.into()),
            }
        }
    }
}
