//! Wisteria Core - 控制反转容器核心
//!
//! 提供一个同步、单例作用域的 IoC 容器：
//! - Bean 定义注册与按名称/类型检索
//! - 显式登记的运行时类型描述符（构造器、setter、能力声明）
//! - 构造器实参匹配（精确类型或装箱对应物）与策略化实例化
//! - 属性填充，引用属性递归解析
//! - 三层后置处理器扩展点与严格的刷新调用次序
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use wisteria_core::prelude::*;
//!
//! #[derive(Default)]
//! struct UserService {
//!     name: String,
//! }
//!
//! let context = ApplicationContext::new();
//! let class = BeanClass::builder::<UserService>("UserService")
//!     .default_constructor(UserService::default)
//!     .property("name", |bean, name: String| bean.name = name)
//!     .build();
//! context.register_bean_definition(
//!     "userService",
//!     BeanDefinition::new(class).with_property("name", BeanValue::literal("wisteria".to_string())),
//! );
//! context.refresh().unwrap();
//!
//! let service = context.get_bean("userService").unwrap();
//! let service = service.downcast::<UserService>().unwrap();
//! assert_eq!(service.name, "wisteria");
//! ```

pub mod bean;
pub mod bean_class;
pub mod bean_factory;
pub mod context;
pub mod error;
pub mod instantiation;
pub mod lifecycle;
pub mod logging;
pub mod post_processor;
pub mod reader;
pub mod singleton;
pub mod utils;

pub use bean::{
    BeanDefinition, BeanInstance, BeanReference, BeanValue, BoxedBean, MutablePropertyValues,
    PropertyValue,
};
pub use bean_class::{BeanClass, BeanClassBuilder, ConstructorArgs, ConstructorSpec, ParamType};
pub use bean_factory::{
    BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableBeanFactory,
    ConfigurableListableBeanFactory, DefaultListableBeanFactory, ListableBeanFactory,
};
pub use context::ApplicationContext;
pub use error::{ContainerError, ContainerResult};
pub use instantiation::{
    InstantiationStrategy, SimpleInstantiationStrategy, SubclassingInstantiationStrategy,
};
pub use lifecycle::{
    BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor, BeanPostProcessor,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use post_processor::{ContextPostProcessor, PostProcessorRegistrationDelegate};
pub use reader::BeanDefinitionReader;
pub use singleton::{DefaultSingletonBeanRegistry, SingletonBeanRegistry};

/// 常用导出
pub mod prelude {
    pub use crate::bean::{
        BeanDefinition, BeanInstance, BeanReference, BeanValue, BoxedBean, MutablePropertyValues,
        PropertyValue,
    };
    pub use crate::bean_class::{BeanClass, ConstructorArgs, ParamType};
    pub use crate::bean_factory::{
        BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableBeanFactory,
        ConfigurableListableBeanFactory, DefaultListableBeanFactory, ListableBeanFactory,
    };
    pub use crate::context::ApplicationContext;
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::instantiation::{
        InstantiationStrategy, SimpleInstantiationStrategy, SubclassingInstantiationStrategy,
    };
    pub use crate::lifecycle::{
        BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor, BeanPostProcessor,
    };
    pub use crate::reader::BeanDefinitionReader;
    pub use crate::singleton::SingletonBeanRegistry;
}
