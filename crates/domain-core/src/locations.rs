//! 场所聚合：地址、门店、仓库

use bookmart_common::{AddressId, AuditInfo, ShopId, WarehouseId};
use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// 地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub city: String,
    pub street: String,
    pub building: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        building: impl Into<String>,
    ) -> AppResult<Self> {
        let city = city.into();
        let street = street.into();
        let building = building.into();
        if city.trim().is_empty() || street.trim().is_empty() {
            return Err(AppError::validation("Address city/street must not be blank"));
        }
        Ok(Self {
            id: AddressId::new(),
            city,
            street,
            building,
        })
    }
}

impl Entity for Address {
    type Id = AddressId;

    fn id(&self) -> &AddressId {
        &self.id
    }
}

/// 门店
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub address_id: AddressId,
    pub audit: AuditInfo,
}

impl Shop {
    pub fn new(name: impl Into<String>, address_id: AddressId) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::validation("Shop name must not be blank"));
        }
        Ok(Self {
            id: ShopId::new(),
            name,
            address_id,
            audit: AuditInfo::new(),
        })
    }
}

impl Entity for Shop {
    type Id = ShopId;

    fn id(&self) -> &ShopId {
        &self.id
    }
}

/// 仓库
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub address_id: AddressId,
    pub audit: AuditInfo,
}

impl Warehouse {
    pub fn new(name: impl Into<String>, address_id: AddressId) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::validation("Warehouse name must not be blank"));
        }
        Ok(Self {
            id: WarehouseId::new(),
            name,
            address_id,
            audit: AuditInfo::new(),
        })
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &WarehouseId {
        &self.id
    }
}
