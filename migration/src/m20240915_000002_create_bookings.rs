use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20240915_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(CabType::Enum)
                    .values([CabType::Standard, CabType::Premium, CabType::Luxury])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::Pending,
                        BookingStatus::Accepted,
                        BookingStatus::Rejected,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(string_len(Booking::BookingCode, 64).not_null().unique_key())
                    .col(uuid(Booking::UserId).not_null())
                    .col(string_len(Booking::UserEmail, 255).not_null())
                    .col(text(Booking::Destination).not_null())
                    .col(ColumnDef::new(Booking::CabType).custom(CabType::Enum).not_null())
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null()
                            .default(Expr::cust("'Pending'")),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_user_id")
                    .table(Booking::Table)
                    .col(Booking::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CabType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    BookingCode,
    UserId,
    UserEmail,
    Destination,
    CabType,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum CabType {
    #[sea_orm(iden = "cab_type")]
    Enum,
    #[sea_orm(iden = "standard")]
    Standard,
    #[sea_orm(iden = "premium")]
    Premium,
    #[sea_orm(iden = "luxury")]
    Luxury,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "Pending")]
    Pending,
    #[sea_orm(iden = "Accepted")]
    Accepted,
    #[sea_orm(iden = "Rejected")]
    Rejected,
}
