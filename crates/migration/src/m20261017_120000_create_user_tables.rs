//! Local user accounts and their per-application role grants.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppUser::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppUser::UserName).string().null().unique_key())
                    .col(ColumnDef::new(AppUser::Email).string().null().unique_key())
                    .col(ColumnDef::new(AppUser::Name).string().null())
                    .col(ColumnDef::new(AppUser::LastName).string().null())
                    .col(ColumnDef::new(AppUser::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(AppUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AppUser::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Roles are a JSON array; row order is the order roles are reported in
        manager
            .create_table(
                Table::create()
                    .table(ApplicationRole::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApplicationRole::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApplicationRole::UserId).string().not_null())
                    .col(
                        ColumnDef::new(ApplicationRole::ApplicationName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationRole::Roles)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_application_role_user_id")
                            .from(ApplicationRole::Table, ApplicationRole::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_application_role_user_id")
                    .table(ApplicationRole::Table)
                    .col(ApplicationRole::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApplicationRole::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AppUser::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AppUser {
    Table,
    Id,
    UserName,
    Email,
    Name,
    LastName,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApplicationRole {
    Table,
    Id,
    UserId,
    ApplicationName,
    Roles,
}
