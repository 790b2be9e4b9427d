//! Bean 实例化策略
//!
//! 把"如何执行构造"从创建流程中抽出来，作为工厂上可替换的缝隙

use crate::bean::{BeanDefinition, BoxedBean};
use crate::bean_class::ConstructorSpec;
use crate::error::{ContainerError, ContainerResult};

/// 实例化策略契约
///
/// `constructor` 为 `None` 时走零参构造路径；
/// 所有失败统一上浮为 `BeanInstantiation`
pub trait InstantiationStrategy: Send + Sync {
    fn instantiate(
        &self,
        definition: &BeanDefinition,
        bean_name: &str,
        constructor: Option<&ConstructorSpec>,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BoxedBean>;
}

/// 直接调用登记的构造器
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleInstantiationStrategy;

impl InstantiationStrategy for SimpleInstantiationStrategy {
    fn instantiate(
        &self,
        definition: &BeanDefinition,
        bean_name: &str,
        constructor: Option<&ConstructorSpec>,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BoxedBean> {
        let bean_class = definition.bean_class();
        tracing::trace!(
            "Instantiating bean '{}' of type '{}'",
            bean_name,
            bean_class.name()
        );
        let result = match constructor {
            Some(constructor) => constructor.invoke(args),
            None => bean_class.instantiate_default(),
        };
        result.map_err(|err| match err {
            instantiation @ ContainerError::BeanInstantiation { .. } => instantiation,
            other => ContainerError::BeanInstantiation {
                type_name: bean_class.name().to_string(),
                reason: other.to_string(),
            },
        })
    }
}

/// 子类增强策略
///
/// 为方法注入预留的扩展位；当前没有运行时子类生成，构造行为与
/// [`SimpleInstantiationStrategy`] 完全一致。工厂默认使用本策略
#[derive(Debug, Default, Clone, Copy)]
pub struct SubclassingInstantiationStrategy;

impl InstantiationStrategy for SubclassingInstantiationStrategy {
    fn instantiate(
        &self,
        definition: &BeanDefinition,
        bean_name: &str,
        constructor: Option<&ConstructorSpec>,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BoxedBean> {
        SimpleInstantiationStrategy.instantiate(definition, bean_name, constructor, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::BeanDefinition;
    use crate::bean_class::{BeanClass, ParamType};

    #[derive(Default)]
    struct Widget {
        size: i32,
    }

    fn widget_definition() -> BeanDefinition {
        let class = BeanClass::builder::<Widget>("Widget")
            .default_constructor(Widget::default)
            .constructor(vec![ParamType::of::<i32>()], |args| {
                Ok(Widget {
                    size: args.take::<i32>()?,
                })
            })
            .build();
        BeanDefinition::new(class)
    }

    #[test]
    fn test_simple_strategy_default_constructor() {
        let definition = widget_definition();
        let bean = SimpleInstantiationStrategy
            .instantiate(&definition, "widget", None, Vec::new())
            .unwrap();
        assert_eq!(bean.downcast::<Widget>().unwrap().size, 0);
    }

    #[test]
    fn test_strategies_construct_identically() {
        let definition = widget_definition();
        let args = || -> Vec<BoxedBean> { vec![Box::new(7i32)] };
        let constructor = definition.bean_class().resolve_constructor(&args()).unwrap();

        let simple = SimpleInstantiationStrategy
            .instantiate(&definition, "widget", Some(constructor), args())
            .unwrap();
        let subclassing = SubclassingInstantiationStrategy
            .instantiate(&definition, "widget", Some(constructor), args())
            .unwrap();

        assert_eq!(simple.downcast::<Widget>().unwrap().size, 7);
        assert_eq!(subclassing.downcast::<Widget>().unwrap().size, 7);
    }

    #[test]
    fn test_missing_default_constructor_is_instantiation_error() {
        let class = BeanClass::builder::<Widget>("Widget").build();
        let definition = BeanDefinition::new(class);
        let err = SimpleInstantiationStrategy
            .instantiate(&definition, "widget", None, Vec::new())
            .unwrap_err();
        match err {
            ContainerError::BeanInstantiation { type_name, .. } => {
                assert_eq!(type_name, "Widget")
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
