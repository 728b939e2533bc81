//! Request trait 定义

use bookmart_common::{EntityType, OperationDescriptor, OperationType};

/// 入站请求契约
///
/// 每个业务操作都是一个请求值，构造后不可变，且恰好携带一个操作描述符。
/// 聚合类型通过关联常量在编译期与请求的载荷类型绑死，
/// 处理器不可能对 A 聚合鉴权却对 B 聚合动手。
/// 无返回值的操作令 `Result = ()`。
pub trait Request: Send + Sync {
    type Result: Send;

    /// 此请求载荷类型对应的聚合
    const ENTITY: EntityType;

    /// 此请求的操作类型
    fn operation(&self) -> OperationType;

    /// 授权检查用的完整操作描述符
    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor::new(Self::ENTITY, self.operation())
    }
}
